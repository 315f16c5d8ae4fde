//! Write-permission policy consulted before local edits are diffed.

use codesync_common::FileId;

/// Decides whether the local user may edit a file.
pub trait EditPermission {
    fn can_edit(&self, file_id: &FileId) -> bool;
}

/// Every file is editable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl EditPermission for AllowAll {
    fn can_edit(&self, _file_id: &FileId) -> bool {
        true
    }
}

/// No file is editable; remote edits still apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl EditPermission for ReadOnly {
    fn can_edit(&self, _file_id: &FileId) -> bool {
        false
    }
}

impl<F> EditPermission for F
where
    F: Fn(&FileId) -> bool,
{
    fn can_edit(&self, file_id: &FileId) -> bool {
        self(file_id)
    }
}
