mod options;
mod pdf;
mod types;

pub use options::ProofOptions;
pub use pdf::{generate_proof, proof_pdf_bytes, slot_label};
pub use types::*;
