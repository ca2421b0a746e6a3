use ns_sequence::SequenceProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingConfig,
    LoadingEos,
    CheckingCache,
    LoadingCachedResult,
    BuildingSequence,
    LocatingTargets,
    SavingResults,
    Exporting,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingConfig => "config",
            RunStage::LoadingEos => "eos",
            RunStage::CheckingCache => "cache",
            RunStage::LoadingCachedResult => "cached",
            RunStage::BuildingSequence => "sequence",
            RunStage::LocatingTargets => "targets",
            RunStage::SavingResults => "save",
            RunStage::Exporting => "export",
            RunStage::Completed => "done",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    /// Stars finished so far while building the sequence.
    pub sequence: Option<SequenceProgress>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            sequence: None,
        }
    }
}

/// Progress sink. `Send` because sequence progress arrives from worker
/// threads (serialized through a mutex).
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(RunProgressEvent) + Send);
