pub const AUTHORIZATION_HEADER: &str = "Authorization";

pub const DEFAULT_CAPACITY: usize = 1024;
pub const DEFAULT_RECONNECT_ATTEMPTS: usize = 5;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 2_000;
