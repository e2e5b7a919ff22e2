use async_trait::async_trait;
use console::style;
use std::path::{Path, PathBuf};

use super::{DeliveryError, EventSink};

/// Console-backed sink: notifications go to the terminal, delivery copies the
/// artifact into a destination directory.
pub struct ConsoleSink {
    destination: PathBuf,
}

impl ConsoleSink {
    pub fn new(destination: PathBuf) -> Self {
        Self { destination }
    }
}

#[async_trait]
impl EventSink for ConsoleSink {
    async fn notify(&self, text: &str) {
        println!("{} {}", style("•").cyan(), text);
    }

    async fn deliver_artifact(&self, path: &Path) -> Result<(), DeliveryError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| DeliveryError::Rejected(format!("artifact has no file name: {}", path.display())))?;

        fs_err::create_dir_all(&self.destination)?;
        let target = self.destination.join(file_name);
        fs_err::copy(path, &target)?;

        println!("{} Saved to {}", style("✔").green(), style(target.display()).bold());
        Ok(())
    }
}
