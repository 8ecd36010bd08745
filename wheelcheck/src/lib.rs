//! wheelcheck: install a CPlantBox wheel into a throwaway venv and prove it imports.

pub mod cli;
pub mod verify;
