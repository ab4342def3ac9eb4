pub mod classify;
pub mod config;
pub mod correlate;
pub mod errors;
pub mod export;
pub mod features;
pub mod measure;
pub mod mesh_index;
pub mod session;
pub mod units;

pub use classify::{classify_face, classify_surface};
pub use config::{EngineConfig, TessellationParams, ToleranceConfig};
pub use correlate::{correlate, Correspondence, CorrespondenceTable, NameSlot};
pub use errors::{ExportError, FeatureError, LoadError};
pub use export::{export_named, plan_names, ExportOutcome};
pub use features::{Feature, FeatureSet};
pub use measure::measure;
pub use mesh_index::{index_solid, FaceRange, IndexedSolid, MeshBuffers};
pub use session::{LabelSession, LoadInfo};
pub use units::{detect_length_unit, LengthUnit, UnitInfo};
