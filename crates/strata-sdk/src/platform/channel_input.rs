// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crossbeam_channel::{Receiver, Sender};
use strata_core::platform::{InputCollector, InputEvent, InputSource};

/// Default number of events drained per pump.
pub const DEFAULT_EVENTS_PER_PUMP: usize = 1024;

/// An [`InputSource`] fed through a channel.
///
/// Any thread holding a [`Sender`] can inject events (a device thread, a test, a
/// replay tool). Each pump drains at most `limit` events; the rest stay in the
/// channel for the next frame.
#[derive(Debug)]
pub struct ChannelInputSource {
    receiver: Receiver<InputEvent>,
    limit: usize,
}

impl ChannelInputSource {
    /// Wraps `receiver` with the default per-pump limit.
    pub fn new(receiver: Receiver<InputEvent>) -> Self {
        Self::with_limit(receiver, DEFAULT_EVENTS_PER_PUMP)
    }

    /// Wraps `receiver`, draining at most `limit` events per pump (at least 1).
    pub fn with_limit(receiver: Receiver<InputEvent>, limit: usize) -> Self {
        Self {
            receiver,
            limit: limit.max(1),
        }
    }

    /// Creates an unbounded channel and returns its sending half with the source.
    pub fn channel() -> (Sender<InputEvent>, Self) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (sender, Self::new(receiver))
    }

    /// Events waiting in the channel.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl InputSource for ChannelInputSource {
    fn pump(&mut self, collector: &mut InputCollector<'_>) {
        let mut received = 0usize;
        for event in self.receiver.try_iter().take(self.limit) {
            collector.push(event);
            received += 1;
        }
        if received > 0 {
            log::trace!("Channel input: {received} events pumped, {} pending", self.receiver.len());
        }
    }
}
