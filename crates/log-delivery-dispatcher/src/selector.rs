use rand::seq::SliceRandom;

/// Picks the syslog endpoint for one file.
pub trait EndpointSelector: Send + Sync {
    fn select<'a>(&self, endpoints: &'a [String]) -> Option<&'a str>;
}

/// Uniformly random choice, no health checks or stickiness.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelector;

impl EndpointSelector for RandomSelector {
    fn select<'a>(&self, endpoints: &'a [String]) -> Option<&'a str> {
        endpoints
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }
}
