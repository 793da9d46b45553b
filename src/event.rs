use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent};

use crate::item::{PronunciationFeedback, ReviewableItem, WordData};
use crate::session::study::PronunciationTicket;
use crate::session::ticket::RequestId;

pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    Resize(#[allow(dead_code)] u16, #[allow(dead_code)] u16),
    /// A search finished on a worker thread.
    Lookup {
        id: RequestId,
        result: Result<ReviewableItem, String>,
    },
    /// A word picked from a card was looked up for the popup.
    QuickLookup {
        id: RequestId,
        result: Result<WordData, String>,
    },
    Pronunciation {
        ticket: PronunciationTicket,
        result: Result<PronunciationFeedback, String>,
    },
}

pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    tx: mpsc::Sender<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let input_tx = tx.clone();

        thread::spawn(move || {
            loop {
                if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(Event::Key(key)) => {
                            if input_tx.send(AppEvent::Key(key)).is_err() {
                                return;
                            }
                        }
                        Ok(Event::Resize(w, h)) => {
                            if input_tx.send(AppEvent::Resize(w, h)).is_err() {
                                return;
                            }
                        }
                        _ => {}
                    }
                } else if input_tx.send(AppEvent::Tick).is_err() {
                    return;
                }
            }
        });

        Self { rx, tx }
    }

    /// Handle for background workers to post results back to the UI loop.
    pub fn sender(&self) -> mpsc::Sender<AppEvent> {
        self.tx.clone()
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}
