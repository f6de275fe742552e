//! Crafted origin candidates.
//!
//! Each candidate targets a different way a server's allow-list check can
//! be fooled. They are tried in this order and the first reflected one is
//! reported:
//!
//! 1. `https://asdf.com`: an unrelated origin, catches reflect-anything
//! 2. `https://asdf<domain>`: prefix match on the trusted domain
//! 3. `https://<domain>asdf.com`: suffix/substring match
//! 4. `null`: sandboxed iframes and `file:` pages
//! 5. `https://asdf.<domain>asdf.com`: subdomain of an attacker-owned host
//!
//! # Examples
//!
//! ```
//! use cors_probe_lib::origin_candidates;
//!
//! let origins = origin_candidates("example.com");
//! assert_eq!(origins[1], "https://asdfexample.com");
//! assert_eq!(origins[3], "null");
//! ```

/// Number of candidates tried per URL.
pub const CANDIDATE_COUNT: usize = 5;

/// Build the origin candidates for `domain`, in probe order.
///
/// The domain is substituted verbatim; an empty domain still yields five
/// candidates.
pub fn origin_candidates(domain: &str) -> [String; CANDIDATE_COUNT] {
    [
        "https://asdf.com".to_string(),
        format!("https://asdf{}", domain),
        format!("https://{}asdf.com", domain),
        "null".to_string(),
        format!("https://asdf.{}asdf.com", domain),
    ]
}
