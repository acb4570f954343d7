use crate::model::VariableMap;

/// Read-only source of system environment variables for the overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEnv {
    kind: SystemEnvKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SystemEnvKind {
    /// Read the live process environment when the overlay is built.
    Process,
    /// Use an explicit map in place of the process environment.
    Memory(VariableMap),
}

impl Default for SystemEnv {
    fn default() -> Self {
        Self::process()
    }
}

impl SystemEnv {
    pub fn process() -> Self {
        Self {
            kind: SystemEnvKind::Process,
        }
    }

    /// Substitute an explicit map for the process environment.
    pub fn from_memory(map: VariableMap) -> Self {
        Self {
            kind: SystemEnvKind::Memory(map),
        }
    }

    /// Copy every variable into a fresh map.
    ///
    /// Non-UTF-8 process variables are converted lossily.
    pub fn snapshot(&self) -> VariableMap {
        match &self.kind {
            SystemEnvKind::Process => std::env::vars_os()
                .map(|(key, value)| {
                    (
                        key.to_string_lossy().into_owned(),
                        value.to_string_lossy().into_owned(),
                    )
                })
                .collect(),
            SystemEnvKind::Memory(map) => map.clone(),
        }
    }
}
