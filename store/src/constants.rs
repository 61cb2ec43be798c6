use bincode::config::{Configuration, Fixint, LittleEndian, NoLimit};

// Fixed-width integer encoding (record size needs to be constant so chunks can
// be decoded back to back)
pub const BINCODE_CONFIG: Configuration<LittleEndian, Fixint, NoLimit> =
    bincode::config::legacy();

/// File name of the built store inside a data directory.
pub const STORE_FILE_NAME: &str = "place2022.store";
