use crate::error::Error;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub(crate) fn open_ct<T>(x: subtle::CtOption<T>) -> Option<T> {
    if bool::from(x.is_some()) {
        Some(x.unwrap())
    } else {
        None
    }
}

fn since_epoch(t: SystemTime) -> Result<Duration, Error> {
    t.duration_since(UNIX_EPOCH).map_err(|_e| Error::Clock)
}

/// Current UNIX time in seconds.
pub fn now_secs() -> Result<u64, Error> {
    Ok(since_epoch(SystemTime::now())?.as_secs())
}

/// Current UNIX time in milliseconds.
pub fn now_millis() -> Result<u64, Error> {
    Ok(u64::try_from(since_epoch(SystemTime::now())?.as_millis())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_before_epoch() {
        let before = UNIX_EPOCH - Duration::from_secs(1);
        assert!(matches!(since_epoch(before), Err(Error::Clock)));

        let after = UNIX_EPOCH + Duration::from_millis(1566722350123);
        assert_eq!(since_epoch(after).unwrap().as_millis(), 1566722350123);
    }

    #[test]
    fn test_now() {
        let secs = now_secs().unwrap();
        let millis = now_millis().unwrap();
        assert!(millis / 1000 >= secs);
    }
}
