pub mod clean;
pub mod inpaint;
pub mod upload;
