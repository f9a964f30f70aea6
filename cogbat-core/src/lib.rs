pub mod error;
pub mod geometry;
pub mod metrics;
pub mod phase;
pub mod ports;
pub mod stimulus;
pub mod trial;

pub use error::EngineError;
pub use geometry::{CANVAS_HEIGHT, CANVAS_WIDTH, Point};
pub use metrics::{
    CorsiMetrics, FivePointMetrics, MetricsRecord, StroopMetrics, TrailMetrics, TrailPassMetrics,
    round2,
};
pub use phase::SessionPhase;
pub use ports::{
    InputEvent, InputFilter, InteractionPort, MemoryStore, PortEvent, ResultStore, SaveRequest,
};
pub use stimulus::{
    ArrowDirection, ArrowPosition, CorsiDirection, CorsiLayout, DesignRecord, FIVE_POINT_CENTER,
    FIVE_POINT_DIAGONALS, Novelty, ResponseRecord, StimulusRecord, StimulusView, StroopStimulus,
    TrailForm, TrailLayout, TrailNode, canonical_form, five_point_dots,
};
pub use trial::{InstrumentId, ParticipantId, TrialCondition, TrialPhase, TrialRecord};
