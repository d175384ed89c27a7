//! Routes hand-off messages from secondary launches

use std::path::Path;

use glimpse_ipc::InstanceMessage;

use crate::Result;

/// Anything that can open a file without asking the user
pub trait FileOpenTarget {
    fn load_file_non_interactive(&mut self, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct MessageDispatcher {
    version: String,
}

impl MessageDispatcher {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Open every file of `message`, in order. Returns how many loads were
    /// delivered to a window.
    pub fn dispatch<T: FileOpenTarget>(&self, message: InstanceMessage, target: &mut T) -> usize {
        if message.version != self.version {
            tracing::warn!(
                sender = %message.version,
                ours = %self.version,
                "Message from a different application version"
            );
        }

        tracing::info!(
            file_count = message.files.len(),
            "Opening files from another launch"
        );

        let mut delivered = 0;
        for file in &message.files {
            match target.load_file_non_interactive(Path::new(file)) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::error!(file = %file, error = %e, "Failed to open file"),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingTarget {
        loaded: Vec<PathBuf>,
        fail_on: Option<PathBuf>,
    }

    impl FileOpenTarget for RecordingTarget {
        fn load_file_non_interactive(&mut self, path: &Path) -> Result<()> {
            if self.fail_on.as_deref() == Some(path) {
                return Err(CoreError::Window("no window".to_string()));
            }
            self.loaded.push(path.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn test_files_dispatched_in_order() {
        let dispatcher = MessageDispatcher::new("1.0.0");
        let mut target = RecordingTarget::default();
        let message = InstanceMessage::new("1.0.0", vec!["a.log".into(), "b.log".into()]);

        assert_eq!(dispatcher.dispatch(message, &mut target), 2);
        assert_eq!(
            target.loaded,
            vec![PathBuf::from("a.log"), PathBuf::from("b.log")]
        );
    }

    #[test]
    fn test_failed_file_does_not_stop_the_rest() {
        let dispatcher = MessageDispatcher::new("1.0.0");
        let mut target = RecordingTarget {
            fail_on: Some(PathBuf::from("a.log")),
            ..Default::default()
        };
        let message = InstanceMessage::new("0.9.0", vec!["a.log".into(), "b.log".into()]);

        assert_eq!(dispatcher.dispatch(message, &mut target), 1);
        assert_eq!(target.loaded, vec![PathBuf::from("b.log")]);
    }

    #[test]
    fn test_empty_message_is_noop() {
        let dispatcher = MessageDispatcher::new("1.0.0");
        let mut target = RecordingTarget::default();

        assert_eq!(
            dispatcher.dispatch(InstanceMessage::new("1.0.0", Vec::new()), &mut target),
            0
        );
        assert!(target.loaded.is_empty());
    }
}
