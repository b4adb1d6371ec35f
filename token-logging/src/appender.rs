// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};

/// Name of the active log file inside the log directory.
pub(crate) const LOG_FILE_NAME: &str = "token-orchestrator.log";

const MAX_LOG_SIZE: usize = 20 * 1024 * 1024;
const MAX_UNCOMPRESSED_LOG_FILES: usize = 10;
const MAX_LOG_FILES: usize = 1000;

/// How many rotated files are kept, and how many of them stay uncompressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RotationPolicy {
    max_bytes: usize,
    uncompressed_files: usize,
    total_files: usize,
}

impl RotationPolicy {
    /// Without an archive count the total falls back to `MAX_LOG_FILES`, never below the
    /// uncompressed count.
    pub(crate) fn new(uncompressed_files: Option<usize>, archived_files: Option<usize>) -> Self {
        let uncompressed_files = uncompressed_files.unwrap_or(MAX_UNCOMPRESSED_LOG_FILES);
        let total_files = match archived_files {
            Some(archived) => uncompressed_files.saturating_add(archived),
            None => uncompressed_files.max(MAX_LOG_FILES),
        };
        Self {
            max_bytes: MAX_LOG_SIZE,
            uncompressed_files,
            total_files,
        }
    }

    /// Opens `LOG_FILE_NAME` in `dir` behind a lossless non-blocking writer.
    /// The guard flushes pending lines when dropped.
    pub(crate) fn writer(&self, dir: &Path) -> (NonBlocking, WorkerGuard) {
        let rotating_file = FileRotate::new(
            dir.join(LOG_FILE_NAME),
            AppendTimestamp::default(FileLimit::MaxFiles(self.total_files)),
            ContentLimit::BytesSurpassed(self.max_bytes),
            Compression::OnRotate(self.uncompressed_files),
            #[cfg(unix)]
            None,
        );

        NonBlockingBuilder::default()
            .lossy(false)
            .finish(rotating_file)
    }
}
