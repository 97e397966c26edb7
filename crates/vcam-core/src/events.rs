//! Transition notifications.

use tracing::info;

use crate::metrics;
use vcam_models::CameraEvent;

/// Receives camera events.
pub trait CameraEventListener {
    fn on_event(&mut self, event: &CameraEvent);
}

impl<F> CameraEventListener for F
where
    F: FnMut(&CameraEvent),
{
    fn on_event(&mut self, event: &CameraEvent) {
        self(event)
    }
}

/// Fans events out to subscribed listeners in subscription order.
#[derive(Default)]
pub struct EventHub {
    listeners: Vec<Box<dyn CameraEventListener>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn CameraEventListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Log, count and deliver one event.
    pub fn emit(&mut self, event: CameraEvent) {
        info!(kind = event.as_str(), ?event, "Camera event");
        metrics::record_event(event.as_str());
        for listener in self.listeners.iter_mut() {
            listener.on_event(&event);
        }
    }
}
