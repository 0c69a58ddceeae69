//! Quality Gate Engine.
//!
//! Holds the ordered set of password quality gates (built-in and user-defined) and scores
//! passwords by counting the enabled gates they pass. The set is immutable once built; every
//! mutation swaps in a new [`GateSet`], so a scoring pass working on a snapshot never sees a
//! half-applied change.

use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::services::delimited_codec::{RowBuilder, RowParser};
use crate::types::errors::GateError;
use crate::types::gate::QualityGate;

/// Built-in gates as (id, pattern, description).
const BUILTIN_GATES: [(&str, &str, &str); 5] = [
    ("builtin.length", ".{8,}", "Contains at least 8 characters"),
    ("builtin.lowercase", ".*[a-z].*", "Contains a lowercase letter"),
    ("builtin.uppercase", ".*[A-Z].*", "Contains an uppercase letter"),
    ("builtin.digit", ".*[0-9].*", "Contains a digit"),
    ("builtin.special", ".*[^a-zA-Z0-9].*", "Contains a special character"),
];

/// Returns the built-in gates in their fixed order.
pub fn builtin_gates() -> Vec<QualityGate> {
    BUILTIN_GATES
        .iter()
        .map(|(id, pattern, description)| QualityGate::builtin(id, pattern, description))
        .collect()
}

/// A gate with its compiled predicate.
#[derive(Debug, Clone)]
pub struct CompiledGate {
    gate: QualityGate,
    regex: Regex,
}

impl CompiledGate {
    pub fn compile(gate: QualityGate) -> Result<Self, GateError> {
        let regex = Regex::new(&format!("^(?:{})$", gate.pattern))
            .map_err(|e| GateError::InvalidPattern(format!("{}: {}", gate.id, e)))?;
        Ok(Self { gate, regex })
    }

    pub fn gate(&self) -> &QualityGate {
        &self.gate
    }

    pub fn matches(&self, password: &str) -> bool {
        self.regex.is_match(password)
    }
}

/// Immutable snapshot of the gate collection.
#[derive(Debug, Clone, Default)]
pub struct GateSet {
    gates: Vec<CompiledGate>,
}

impl GateSet {
    pub fn new(gates: Vec<CompiledGate>) -> Self {
        Self { gates }
    }

    /// Number of enabled gates the password passes.
    pub fn passed(&self, password: &str) -> usize {
        self.gates
            .iter()
            .filter(|g| g.gate.enabled && g.matches(password))
            .count()
    }

    /// Number of enabled gates; the scoring denominator.
    pub fn total(&self) -> usize {
        self.gates.iter().filter(|g| g.gate.enabled).count()
    }

    pub fn gates(&self) -> impl Iterator<Item = &QualityGate> {
        self.gates.iter().map(|g| &g.gate)
    }
}

pub struct QualityGateEngine {
    current: RwLock<Arc<GateSet>>,
}

impl QualityGateEngine {
    /// Creates an engine holding the built-in gates only.
    pub fn new() -> Self {
        let gates = builtin_gates()
            .into_iter()
            .filter_map(|g| CompiledGate::compile(g).ok())
            .collect();
        Self::from_set(GateSet::new(gates))
    }

    /// Creates an engine from an explicit gate list, built-ins not included.
    pub fn from_gates(gates: Vec<QualityGate>) -> Result<Self, GateError> {
        let compiled = gates
            .into_iter()
            .map(CompiledGate::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_set(GateSet::new(compiled)))
    }

    fn from_set(set: GateSet) -> Self {
        Self {
            current: RwLock::new(Arc::new(set)),
        }
    }

    /// Returns the current gate set. Later mutations do not affect the returned snapshot.
    pub fn snapshot(&self) -> Arc<GateSet> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn calculate_passed_quality_gates(&self, password: &str) -> usize {
        self.snapshot().passed(password)
    }

    pub fn number_of_quality_gates(&self) -> usize {
        self.snapshot().total()
    }

    pub fn gates(&self) -> Vec<QualityGate> {
        self.snapshot().gates().cloned().collect()
    }

    pub fn gate(&self, id: &str) -> Option<QualityGate> {
        self.snapshot().gates().find(|g| g.id == id).cloned()
    }

    /// Appends a user-defined gate.
    pub fn add_gate(&self, gate: QualityGate) -> Result<(), GateError> {
        if !gate.editable {
            return Err(GateError::NotEditable(gate.id));
        }
        let id = gate.id.clone();
        let compiled = CompiledGate::compile(gate)?;
        self.mutate(|gates| {
            if gates.iter().any(|g| g.gate.id == id) {
                return Err(GateError::DuplicateId(id.clone()));
            }
            gates.push(compiled);
            Ok(())
        })?;
        info!(gate = %id, "quality gate added");
        Ok(())
    }

    /// Replaces an editable gate, keeping its ID and position.
    pub fn update_gate(&self, id: &str, gate: QualityGate) -> Result<(), GateError> {
        let compiled = CompiledGate::compile(QualityGate {
            id: id.to_string(),
            editable: true,
            ..gate
        })?;
        self.mutate(|gates| {
            let slot = Self::editable_slot(gates, id)?;
            gates[slot] = compiled;
            Ok(())
        })?;
        info!(gate = %id, "quality gate updated");
        Ok(())
    }

    /// Removes an editable gate.
    pub fn remove_gate(&self, id: &str) -> Result<QualityGate, GateError> {
        let removed = self.mutate(|gates| {
            let slot = Self::editable_slot(gates, id)?;
            Ok(gates.remove(slot).gate)
        })?;
        info!(gate = %id, "quality gate removed");
        Ok(removed)
    }

    /// Enables or disables any gate, built-in ones included.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), GateError> {
        self.mutate(|gates| {
            let gate = gates
                .iter_mut()
                .find(|g| g.gate.id == id)
                .ok_or_else(|| GateError::NotFound(id.to_string()))?;
            gate.gate.enabled = enabled;
            Ok(())
        })?;
        debug!(gate = %id, enabled, "quality gate toggled");
        Ok(())
    }

    /// Replaces every user-defined gate at once. Built-in gates are kept.
    pub fn replace_custom_gates(&self, custom: Vec<QualityGate>) -> Result<(), GateError> {
        let mut compiled = Vec::with_capacity(custom.len());
        for gate in custom {
            compiled.push(CompiledGate::compile(QualityGate {
                editable: true,
                ..gate
            })?);
        }
        self.mutate(|gates| {
            gates.retain(|g| !g.gate.editable);
            gates.extend(compiled);
            Ok(())
        })
    }

    fn editable_slot(gates: &[CompiledGate], id: &str) -> Result<usize, GateError> {
        let slot = gates
            .iter()
            .position(|g| g.gate.id == id)
            .ok_or_else(|| GateError::NotFound(id.to_string()))?;
        if !gates[slot].gate.editable {
            return Err(GateError::NotEditable(id.to_string()));
        }
        Ok(slot)
    }

    /// Applies `change` to a copy of the current gates and publishes it if it succeeds.
    fn mutate<T, F>(&self, change: F) -> Result<T, GateError>
    where
        F: FnOnce(&mut Vec<CompiledGate>) -> Result<T, GateError>,
    {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let mut gates = guard.gates.clone();
        let result = change(&mut gates)?;
        *guard = Arc::new(GateSet::new(gates));
        Ok(result)
    }

    /// Writes the gate settings: one row with the built-in enabled flags, then one row per
    /// user-defined gate (`id, pattern, description, enabled, author`).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GateError> {
        let snapshot = self.snapshot();
        let mut builder = RowBuilder::new();
        for gate in snapshot.gates().filter(|g| !g.editable) {
            builder.append(gate.enabled);
        }
        builder.new_line();
        for gate in snapshot.gates().filter(|g| g.editable) {
            builder
                .append(gate.id.as_str())
                .append(gate.pattern.as_str())
                .append(gate.description.as_str())
                .append(gate.enabled)
                .append(gate.author.as_deref());
            builder.new_line();
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| GateError::IoError(e.to_string()))?;
        }
        fs::write(path, builder.finish()).map_err(|e| GateError::IoError(e.to_string()))
    }

    /// Restores gate settings written by [`QualityGateEngine::save`].
    ///
    /// A missing file leaves the engine unchanged. Malformed custom rows are skipped and a
    /// built-in row of the wrong length is ignored.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<(), GateError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(());
        }
        let text = fs::read_to_string(path).map_err(|e| GateError::IoError(e.to_string()))?;
        let mut parser = RowParser::new(&text);

        let mut builtins = builtin_gates();
        let flags = parser.next_row();
        if flags.len() == builtins.len() {
            for (gate, flag) in builtins.iter_mut().zip(flags) {
                gate.enabled = flag.map(|f| f == "true").unwrap_or(true);
            }
        } else {
            warn!(columns = flags.len(), "ignoring built-in gate flags of unexpected length");
        }

        let mut compiled = Vec::new();
        for gate in builtins {
            compiled.push(CompiledGate::compile(gate)?);
        }
        while parser.has_next() {
            let row = parser.next_row();
            match Self::custom_from_row(row) {
                Some(gate) => match CompiledGate::compile(gate) {
                    Ok(gate) if compiled.iter().all(|g| g.gate.id != gate.gate.id) => {
                        compiled.push(gate)
                    }
                    Ok(gate) => warn!(gate = %gate.gate.id, "skipping duplicate quality gate"),
                    Err(e) => warn!(error = %e, "skipping quality gate with invalid pattern"),
                },
                None => warn!("skipping malformed quality gate row"),
            }
        }

        let count = compiled.len();
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(GateSet::new(compiled));
        info!(path = %path.display(), gates = count, "quality gates loaded");
        Ok(())
    }

    fn custom_from_row(row: Vec<Option<String>>) -> Option<QualityGate> {
        let mut columns = row.into_iter();
        let id = columns.next()??;
        let pattern = columns.next()??;
        let description = columns.next().flatten().unwrap_or_default();
        let enabled = columns.next().flatten().map(|f| f == "true").unwrap_or(true);
        let author = columns.next().flatten();
        if id.is_empty() {
            return None;
        }
        Some(QualityGate {
            id,
            pattern,
            description,
            enabled,
            editable: true,
            author,
        })
    }
}

impl Default for QualityGateEngine {
    fn default() -> Self {
        Self::new()
    }
}
