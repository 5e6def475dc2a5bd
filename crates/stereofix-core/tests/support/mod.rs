// Scripted `CommandRunner` shared by the integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use stereofix_core::{CommandOutput, CommandRunner, PhaseDurations, RecoveryConfig};

pub const ADDRESS: &str = "AA:BB:CC:DD:EE:FF";
pub const NAME: &str = "WH-1000XM4";

/// Inventory listing with the test headset under `section`.
pub fn inventory(section: &str, services: &str) -> String {
    format!(
        "Bluetooth:\n\n      Bluetooth Controller:\n          State: On\n      {section}:\n          {NAME}:\n              Address: {ADDRESS}\n              Minor Type: Headphones\n              Services: {services}\n"
    )
}

pub fn inventory_low() -> CommandOutput {
    CommandOutput::ok(inventory("Connected", "HFP"))
}

pub fn inventory_high() -> CommandOutput {
    CommandOutput::ok(inventory("Connected", "A2DP AAC"))
}

pub fn inventory_absent() -> CommandOutput {
    CommandOutput::ok(inventory("Not Connected", ""))
}

pub fn control(args: &str) -> String {
    format!("blueutil {args}")
}

/// Responses keyed by the full command line. Each key holds a queue;
/// its last response repeats once the queue is down to one. Overrides
/// registered with [`ScriptedRunner::after`] win once their trigger
/// command has run.
#[derive(Default)]
pub struct ScriptedRunner {
    available: HashSet<String>,
    responses: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    overrides: Vec<(String, String, CommandOutput)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new(available: &[&str]) -> Self {
        Self {
            available: available.iter().map(|p| (*p).to_owned()).collect(),
            ..Self::default()
        }
    }

    pub fn respond(self, command: &str, output: CommandOutput) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(command.to_owned())
            .or_default()
            .push_back(output);
        self
    }

    /// Answer `command` with `output` once `trigger` has been called.
    pub fn after(mut self, trigger: &str, command: &str, output: CommandOutput) -> Self {
        self.overrides
            .push((trigger.to_owned(), command.to_owned(), output));
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, command: &str) -> usize {
        self.calls().iter().filter(|c| *c == command).count()
    }

    /// Calls that would change device state.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                c.contains("--connect")
                    || c.contains("--disconnect")
                    || c.starts_with("pkill")
                    || c.starts_with("osascript")
                    || c.contains(" -s ")
            })
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    fn is_available(&self, program: &str) -> bool {
        self.available.contains(program)
    }

    async fn run(&self, program: &str, args: &[&str], _timeout: Duration) -> CommandOutput {
        let key = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        let previous = self.calls();
        self.calls.lock().unwrap().push(key.clone());

        if !self.available.contains(program) {
            return CommandOutput::not_found(program);
        }
        if let Some((_, _, output)) = self
            .overrides
            .iter()
            .rev()
            .find(|(trigger, command, _)| *command == key && previous.contains(trigger))
        {
            return output.clone();
        }

        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => CommandOutput::failed(1, format!("unscripted command: {key}")),
        }
    }
}

/// Config targeting the test headset with short, distinct waits.
pub fn config() -> RecoveryConfig {
    RecoveryConfig {
        address: Some(ADDRESS.parse().unwrap()),
        name: Some(NAME.to_owned()),
        durations: PhaseDurations {
            disconnect_wait: Duration::from_secs(3),
            reconnect_wait: Duration::from_secs(2),
            retry_pause: Duration::from_secs(2),
            fallback_pause: Duration::from_secs(1),
            command_timeout: Duration::from_secs(10),
        },
        ..RecoveryConfig::default()
    }
}
