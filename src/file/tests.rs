//! End-to-end scenarios exercising the full page-file lifecycle.

use tempfile::TempDir;

use super::{PAGE_SIZE, PageFile, PageFileError};

fn digit_pattern() -> Vec<u8> {
    (0..PAGE_SIZE).map(|i| (i % 10) as u8 + b'0').collect()
}

fn lowercase_pattern() -> Vec<u8> {
    (0..PAGE_SIZE).map(|i| (i % 26) as u8 + b'a').collect()
}

fn uppercase_pattern() -> Vec<u8> {
    (0..PAGE_SIZE).map(|i| (i % 26) as u8 + b'A').collect()
}

#[test]
fn test_create_open_close() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test_pagefile.bin");

    PageFile::create(&test_file).unwrap();

    let mut pf = PageFile::open(&test_file).unwrap();
    assert_eq!(pf.path(), test_file.as_path());
    assert_eq!(pf.total_pages(), 1);
    assert_eq!(pf.block_pos(), Some(0));

    pf.close().unwrap();
    PageFile::destroy(&test_file).unwrap();

    // After destruction the file is gone for good.
    assert!(matches!(
        PageFile::open(&test_file),
        Err(PageFileError::NotFound(_))
    ));
}

#[test]
fn test_single_page_content() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test_pagefile.bin");

    PageFile::create(&test_file).unwrap();
    let mut pf = PageFile::open(&test_file).unwrap();

    // A freshly created file starts with one zero page.
    let mut page = vec![0xffu8; PAGE_SIZE];
    pf.read_first_block(&mut page).unwrap();
    assert!(page.iter().all(|&b| b == 0));

    pf.write_block(0, &digit_pattern()).unwrap();

    pf.read_first_block(&mut page).unwrap();
    assert_eq!(page, digit_pattern());

    pf.close().unwrap();
    PageFile::destroy(&test_file).unwrap();
}

#[test]
fn test_multiple_page_content() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test_pagefile.bin");

    PageFile::create(&test_file).unwrap();
    let mut pf = PageFile::open(&test_file).unwrap();

    let mut page = vec![0u8; PAGE_SIZE];

    // First block: digits.
    pf.write_block(0, &digit_pattern()).unwrap();
    pf.read_block(0, &mut page).unwrap();
    assert_eq!(page, digit_pattern());
    assert_eq!(pf.block_pos(), Some(0));

    // Writing one past the end grows the file to two pages.
    pf.write_block(1, &digit_pattern()).unwrap();
    assert_eq!(pf.total_pages(), 2);
    assert_eq!(pf.block_pos(), Some(1));

    // Second block rewritten in place through the cursor.
    pf.write_current_block(&lowercase_pattern()).unwrap();

    pf.read_last_block(&mut page).unwrap();
    assert_eq!(page, lowercase_pattern());
    assert_eq!(pf.block_pos(), Some(1));

    // Grow to four pages and stamp the last one.
    pf.ensure_capacity(4).unwrap();
    pf.write_block(3, &uppercase_pattern()).unwrap();
    assert_eq!(pf.block_pos(), Some(3));

    // Page 2 was produced by growth and must still be all zero.
    pf.read_previous_block(&mut page).unwrap();
    assert!(page.iter().all(|&b| b == 0));
    assert_eq!(pf.block_pos(), Some(2));

    pf.read_previous_block(&mut page).unwrap();
    assert_eq!(page, lowercase_pattern());
    assert_eq!(pf.block_pos(), Some(1));

    pf.read_last_block(&mut page).unwrap();
    assert_eq!(page, uppercase_pattern());
    assert_eq!(pf.block_pos(), Some(3));

    pf.read_first_block(&mut page).unwrap();
    assert_eq!(page, digit_pattern());
    assert_eq!(pf.block_pos(), Some(0));

    // Capacity already satisfied: nothing changes.
    pf.ensure_capacity(4).unwrap();
    assert_eq!(pf.total_pages(), 4);

    pf.close().unwrap();

    // The page count survives a reopen.
    let mut pf = PageFile::open(&test_file).unwrap();
    assert_eq!(pf.total_pages(), 4);
    pf.read_block(3, &mut page).unwrap();
    assert_eq!(page, uppercase_pattern());
    pf.close().unwrap();

    PageFile::destroy(&test_file).unwrap();
}
