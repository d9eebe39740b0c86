pub mod file;

pub use file::{
    FileHeader, HEADER_SIZE, PAGE_SIZE, PageFile, PageFileError, PageFileResult, PageNum,
};
