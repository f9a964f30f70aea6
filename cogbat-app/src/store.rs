use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use cogbat_core::{
    EngineError, InstrumentId, MetricsRecord, ParticipantId, ResultStore, SaveRequest,
};

/// File-backed result store: the whole record list lives in one JSON file,
/// rewritten on every save. One record per participant per instrument;
/// later completions replace earlier ones.
pub struct JsonStore {
    path: PathBuf,
    records: Vec<SaveRequest>,
}

impl JsonStore {
    pub fn open(path: &Path) -> Result<Self> {
        let records = match File::open(path) {
            Ok(file) => serde_json::from_reader(file)
                .with_context(|| format!("results file {} is not readable", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("cannot open results file {}", path.display()));
            }
        };
        Ok(JsonStore {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn write_out(&self) -> Result<(), EngineError> {
        let file = File::create(&self.path)
            .map_err(|err| EngineError::PersistenceFailure(err.to_string()))?;
        serde_json::to_writer_pretty(file, &self.records)
            .map_err(|err| EngineError::PersistenceFailure(err.to_string()))
    }
}

impl ResultStore for JsonStore {
    fn save(&mut self, request: &SaveRequest) -> Result<(), EngineError> {
        match self
            .records
            .iter_mut()
            .find(|r| r.participant == request.participant && r.instrument == request.instrument)
        {
            Some(existing) => *existing = request.clone(),
            None => self.records.push(request.clone()),
        }
        self.write_out()?;
        info!(
            "saved {} result for {} to {}",
            request.instrument,
            request.participant,
            self.path.display()
        );
        Ok(())
    }

    fn previous_result(
        &self,
        participant: &ParticipantId,
        instrument: InstrumentId,
    ) -> Option<MetricsRecord> {
        self.records
            .iter()
            .find(|r| &r.participant == participant && r.instrument == instrument)
            .map(|r| r.metrics.clone())
    }
}
