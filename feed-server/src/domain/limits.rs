use std::fmt;

/// Tunable limits shared by the validator, the factory and the feed composer.
///
/// Built once from [`Settings`](crate::infrastructure::settings::Settings) and
/// handed around behind an `Arc`; nothing mutates it after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PostLimits {
    pub(crate) max_post_length: usize,
    pub(crate) max_file_size_bytes: u64,
    pub(crate) max_comment_length: usize,
    pub(crate) default_page_size: u32,
    pub(crate) max_page_size: u32,
}

impl PostLimits {
    pub(crate) const DEFAULT_MAX_POST_LENGTH: usize = 5000;
    pub(crate) const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    pub(crate) const DEFAULT_MAX_COMMENT_LENGTH: usize = 1000;
    pub(crate) const DEFAULT_PAGE_SIZE: u32 = 10;
    pub(crate) const MAX_PAGE_SIZE: u32 = 100;

    pub(crate) fn max_file_size(&self) -> ByteSize {
        ByteSize(self.max_file_size_bytes)
    }
}

/// A byte count rendered in MB for client-facing messages. Sizes that do not
/// reach a tenth of a MB are shown in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ByteSize(pub(crate) u64);

impl ByteSize {
    const MIB: u64 = 1024 * 1024;
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        if bytes >= Self::MIB && bytes % Self::MIB == 0 {
            write!(f, "{} MB", bytes / Self::MIB)
        } else if bytes >= Self::MIB / 10 {
            write!(f, "{:.1} MB", bytes as f64 / Self::MIB as f64)
        } else {
            write!(f, "{bytes} bytes")
        }
    }
}

impl Default for PostLimits {
    fn default() -> Self {
        Self {
            max_post_length: Self::DEFAULT_MAX_POST_LENGTH,
            max_file_size_bytes: Self::DEFAULT_MAX_FILE_SIZE_BYTES,
            max_comment_length: Self::DEFAULT_MAX_COMMENT_LENGTH,
            default_page_size: Self::DEFAULT_PAGE_SIZE,
            max_page_size: Self::MAX_PAGE_SIZE,
        }
    }
}
