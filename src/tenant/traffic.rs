use crate::network::{Bytes, BytesPerSecond};

// token bucket a flow promises to stay within
#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub struct TrafficContract {
    // unit in bits per second
    rate:u64,
    // unit in bytes
    burst:u64
}

impl TrafficContract {
    pub fn token_bucket(rate:u64,burst:u64) -> Self {
        Self {rate,burst}
    }
    pub fn rate(&self) -> u64 {
        self.rate
    }
    pub fn burst(&self) -> u64 {
        self.burst
    }
    pub fn rate_bytes_per_second(&self) -> BytesPerSecond {
        self.rate as f64/8.0
    }
    pub fn burst_bytes(&self) -> Bytes {
        self.burst as f64
    }
}
