use std::sync::Arc;

use activity_core::errors::Result;
use activity_protocol::entity::{Entity, ObjectRef};
use activity_protocol::timeline::{ExtraData, Namespace};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::writer::{TimelineSink, TimelineWriter};

/// How live timeline writes are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dispatch {
    /// Await each write before returning to the caller.
    #[default]
    Inline,
    /// Hand each write to a background task; failures are logged, not returned.
    Background,
}

impl Dispatch {
    pub fn from_flag(async_dispatch: bool) -> Self {
        if async_dispatch {
            Dispatch::Background
        } else {
            Dispatch::Inline
        }
    }
}

/// Sink that runs writer calls inline or on the tokio runtime depending on [`Dispatch`].
///
/// Background writes are detached tasks: dropping the sink never cancels them.
#[derive(Clone)]
pub struct DispatchedWriter {
    writer: TimelineWriter,
    mode: Dispatch,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl DispatchedWriter {
    pub fn new(writer: TimelineWriter, mode: Dispatch) -> Self {
        Self {
            writer,
            mode,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn mode(&self) -> Dispatch {
        self.mode
    }

    /// Waits for every background write spawned so far.
    pub async fn wait_idle(&self) {
        let pending = std::mem::take(&mut *self.pending.lock());
        for handle in pending {
            if let Err(err) = handle.await {
                warn!(?err, "background timeline write panicked");
            }
        }
    }
}

#[async_trait]
impl TimelineSink for DispatchedWriter {
    async fn push(
        &self,
        owner: ObjectRef,
        source: &Entity,
        event_type: &str,
        namespace: &Namespace,
        extra: &ExtraData,
    ) -> Result<()> {
        match self.mode {
            Dispatch::Inline => self.writer.push(owner, source, event_type, namespace, extra).await,
            Dispatch::Background => {
                let writer = self.writer.clone();
                let source = source.clone();
                let event_type = event_type.to_string();
                let namespace = *namespace;
                let extra = extra.clone();

                let handle = tokio::spawn(async move {
                    match writer
                        .record(owner, &source, &event_type, &namespace, &extra)
                        .await
                    {
                        Ok(_) => {}
                        Err(err) if err.is_caller_error() => {
                            warn!(%owner, %event_type, %err, "background timeline write rejected");
                        }
                        Err(err) => {
                            error!(%owner, %event_type, %err, "background timeline write failed");
                        }
                    }
                });

                let mut pending = self.pending.lock();
                pending.retain(|handle| !handle.is_finished());
                pending.push(handle);
                Ok(())
            }
        }
    }
}
