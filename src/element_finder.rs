use std::time::Duration;

use headless_chrome::{Element, Tab};
use tracing::{debug, warn};

use crate::models::SelectorStrategy;
use crate::utils::error::AppError;

/// Total lookup attempts before a selector is given up on.
pub const MAX_ATTEMPTS: u32 = 2;

/// Pause between lookup attempts.
pub const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Retry-wrapped element lookup against a browser tab.
///
/// Each lookup waits for the element to become visible within the
/// configured timeout, retrying up to [`MAX_ATTEMPTS`] times with a
/// [`RETRY_PAUSE`] between attempts. Failure causes (timeout,
/// not-found, driver errors) are distinguished only in the attempt
/// logs; after exhausting retries every lookup collapses to `None`,
/// which callers must handle.
pub struct ElementFinder {
    timeout: Duration,
    pause: Duration,
}

impl ElementFinder {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pause: RETRY_PAUSE,
        }
    }

    /// Wait for a single element to become visible.
    pub fn find<'a>(
        &self,
        tab: &'a Tab,
        strategy: SelectorStrategy,
        selector: &str,
    ) -> Option<Element<'a>> {
        retry_lookup(selector, self.pause, |attempt| {
            let element = match strategy {
                SelectorStrategy::Css => {
                    tab.wait_for_element_with_custom_timeout(selector, self.timeout)?
                }
                SelectorStrategy::XPath => {
                    tab.wait_for_xpath_with_custom_timeout(selector, self.timeout)?
                }
            };
            debug!(selector, attempt, "element visible");
            Ok(element)
        })
    }

    /// Wait for at least one element of a group to become visible,
    /// then collect the whole group.
    pub fn find_all<'a>(
        &self,
        tab: &'a Tab,
        strategy: SelectorStrategy,
        selector: &str,
    ) -> Option<Vec<Element<'a>>> {
        retry_lookup(selector, self.pause, |attempt| {
            let elements = match strategy {
                SelectorStrategy::Css => {
                    tab.wait_for_element_with_custom_timeout(selector, self.timeout)?;
                    tab.find_elements(selector)?
                }
                SelectorStrategy::XPath => {
                    tab.wait_for_xpath_with_custom_timeout(selector, self.timeout)?;
                    tab.find_elements_by_xpath(selector)?
                }
            };
            debug!(selector, attempt, count = elements.len(), "elements visible");
            Ok(elements)
        })
    }
}

/// Run `lookup` up to [`MAX_ATTEMPTS`] times with `pause` between
/// attempts, logging each failure cause, and collapse exhaustion to
/// `None`.
pub fn retry_lookup<T>(
    selector: &str,
    pause: Duration,
    mut lookup: impl FnMut(u32) -> anyhow::Result<T>,
) -> Option<T> {
    for attempt in 1..=MAX_ATTEMPTS {
        match lookup(attempt) {
            Ok(value) => return Some(value),
            Err(e) => warn!(selector, attempt, error = %e, "lookup attempt failed"),
        }

        if attempt < MAX_ATTEMPTS {
            debug!(selector, attempt = attempt + 1, max = MAX_ATTEMPTS, "retrying");
            std::thread::sleep(pause);
        }
    }

    let failure = AppError::ElementNotFound {
        selector: selector.to_string(),
    };
    warn!(error = %failure, attempts = MAX_ATTEMPTS, "giving up on selector");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::time::Instant;

    #[test]
    fn test_retry_pause_is_one_second() {
        assert_eq!(RETRY_PAUSE, Duration::from_secs(1));
        assert_eq!(MAX_ATTEMPTS, 2);
    }

    #[test]
    fn test_exhausts_exactly_two_attempts_with_pause() {
        let pause = Duration::from_millis(50);
        let mut attempts = Vec::new();
        let started = Instant::now();

        let result: Option<()> = retry_lookup(".never", pause, |attempt| {
            attempts.push(attempt);
            Err(anyhow!("timed out waiting for element"))
        });

        assert!(result.is_none());
        assert_eq!(attempts, vec![1, 2]);
        // Exactly one pause separates the two attempts.
        assert!(started.elapsed() >= pause);
        assert!(started.elapsed() < pause * 3);
    }

    #[test]
    fn test_success_on_second_attempt_stops_retrying() {
        let mut calls = 0;

        let result = retry_lookup(".flaky", Duration::from_millis(10), |attempt| {
            calls += 1;
            if attempt < 2 {
                Err(anyhow!("not yet visible"))
            } else {
                Ok(attempt)
            }
        });

        assert_eq!(result, Some(2));
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_immediate_success_skips_pause() {
        let started = Instant::now();
        let result = retry_lookup(".present", Duration::from_secs(5), |_| Ok("found"));

        assert_eq!(result, Some("found"));
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
