pub mod rag;
pub mod safety;
pub mod storage;
pub mod terms; // Shared vocabulary matching for routing and refusal detection
