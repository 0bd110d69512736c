// src/socket/address.rs
// Normalizes nginx-style `listen` values into (transport, address) pairs.
use super::Transport;

const UNIX_PREFIX: &str = "unix:";
const WILDCARD_HOST: &str = "*";
const DEFAULT_PORT: &str = "80";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AddrParseError {
    #[error("{0}: missing port in address")]
    MissingPort(String),

    #[error("{0}: too many colons in address")]
    TooManyColons(String),

    #[error("{0}: missing ']' in address")]
    MissingBracket(String),

    #[error("{address}: unexpected '{bracket}' in address")]
    UnexpectedBracket { address: String, bracket: char },
}

/// Turns a human-supplied listen spec into the transport and address to bind.
///
/// Accepted forms, checked in this order:
/// - `unix:<path>` → `unix`, the trimmed path
/// - `<port>` → `tcp`, `:<port>` (all interfaces)
/// - `<host>:<port>`, `[<ipv6>]:<port>`, `*:<port>` → `tcp`, canonical
///   `host:port` with `*` rewritten to the empty host
/// - anything else is taken as a bare host and given port 80
///
/// Never fails; unrecognized input ends up in the bare-host branch.
pub fn parse(raw: &str) -> (Transport, String) {
    let value = raw.trim();

    if let Some(path) = value.strip_prefix(UNIX_PREFIX) {
        return (Transport::Unix, path.trim().to_string());
    }

    if is_port_number(value) {
        return (Transport::Tcp, format!(":{value}"));
    }

    if let Ok((host, port)) = split_host_port(value) {
        let host = if host == WILDCARD_HOST { "" } else { host };
        return (Transport::Tcp, join_host_port(host, port));
    }

    // A bare IPv6 literal may still carry its brackets; join adds them back.
    let host = value.trim_matches(|c| c == '[' || c == ']');
    (Transport::Tcp, join_host_port(host, DEFAULT_PORT))
}

// Non-negative decimal in the i64 range, optionally written with a `+`.
fn is_port_number(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) && value.parse::<i64>().is_ok()
}

/// Splits `host:port`, `[host]:port` or `[host%zone]:port` into host and port.
///
/// The host of a bracketed form is returned without its brackets. Either part
/// may be empty.
pub fn split_host_port(hostport: &str) -> Result<(&str, &str), AddrParseError> {
    let colon = hostport
        .rfind(':')
        .ok_or_else(|| AddrParseError::MissingPort(hostport.to_string()))?;

    let (host, open_from, close_from) = if hostport.starts_with('[') {
        let close = hostport
            .find(']')
            .ok_or_else(|| AddrParseError::MissingBracket(hostport.to_string()))?;
        let after = close + 1;
        if after == hostport.len() {
            return Err(AddrParseError::MissingPort(hostport.to_string()));
        }
        if after != colon {
            return Err(if hostport.as_bytes()[after] == b':' {
                AddrParseError::TooManyColons(hostport.to_string())
            } else {
                AddrParseError::MissingPort(hostport.to_string())
            });
        }
        (&hostport[1..close], 1, after)
    } else {
        let host = &hostport[..colon];
        if host.contains(':') {
            return Err(AddrParseError::TooManyColons(hostport.to_string()));
        }
        (host, 0, 0)
    };

    if hostport[open_from..].contains('[') {
        return Err(AddrParseError::UnexpectedBracket {
            address: hostport.to_string(),
            bracket: '[',
        });
    }
    if hostport[close_from..].contains(']') {
        return Err(AddrParseError::UnexpectedBracket {
            address: hostport.to_string(),
            bracket: ']',
        });
    }

    Ok((host, &hostport[colon + 1..]))
}

/// Joins host and port, bracketing any host that contains a colon.
pub fn join_host_port(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(input: &str, transport: Transport, address: &str) {
        let (got_transport, got_address) = parse(input);
        assert_eq!(
            (got_transport, got_address.as_str()),
            (transport, address),
            "for input {input:?}"
        );
    }

    // Forms from nginx's `listen` directive.
    #[test]
    fn test_parse_listen_forms() {
        check("127.0.0.1:8000", Transport::Tcp, "127.0.0.1:8000");
        check("127.0.0.1", Transport::Tcp, "127.0.0.1:80");
        check("8000", Transport::Tcp, ":8000");
        check("*:8000", Transport::Tcp, ":8000");
        check("localhost:8000", Transport::Tcp, "localhost:8000");
        check("localhost", Transport::Tcp, "localhost:80");
        check("[::]:8000", Transport::Tcp, "[::]:8000");
        check("[::1]", Transport::Tcp, "[::1]:80");
        check("unix:/var/run/nginx.sock", Transport::Unix, "/var/run/nginx.sock");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        check("  8000\n", Transport::Tcp, ":8000");
        check("\tunix:  /tmp/a.sock  ", Transport::Unix, "/tmp/a.sock");
    }

    #[test]
    fn test_parse_unix_path_is_not_validated() {
        check("unix:", Transport::Unix, "");
        check("unix:relative/app.sock", Transport::Unix, "relative/app.sock");
        // only the exact lowercase prefix selects unix
        check("UNIX:/a", Transport::Tcp, "UNIX:/a");
    }

    #[test]
    fn test_parse_bare_wildcard_gets_default_port() {
        // `*` without a port is treated as a hostname, not as all interfaces
        check("*", Transport::Tcp, "*:80");
    }

    #[test]
    fn test_parse_bare_ipv6_without_brackets() {
        check("::1", Transport::Tcp, "[::1]:80");
        check("fe80::1%eth0", Transport::Tcp, "[fe80::1%eth0]:80");
    }

    #[test]
    fn test_parse_port_edge_cases() {
        check("0", Transport::Tcp, ":0");
        check(":8000", Transport::Tcp, ":8000");
        check("+80", Transport::Tcp, ":+80");
        check("-1", Transport::Tcp, "-1:80");
        check("++80", Transport::Tcp, "++80:80");
        check("9223372036854775807", Transport::Tcp, ":9223372036854775807");
        // past i64::MAX, so it is a hostname
        check("9223372036854775808", Transport::Tcp, "9223372036854775808:80");
        check("99999999999999999999", Transport::Tcp, "99999999999999999999:80");
    }

    #[test]
    fn test_parse_wildcard_ipv6_host() {
        check("[*]:9000", Transport::Tcp, ":9000");
    }

    #[test]
    fn test_parse_empty_input() {
        check("", Transport::Tcp, ":80");
        check("   ", Transport::Tcp, ":80");
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("localhost:80"), Ok(("localhost", "80")));
        assert_eq!(split_host_port("[::1]:80"), Ok(("::1", "80")));
        assert_eq!(split_host_port("[fe80::1%lo0]:80"), Ok(("fe80::1%lo0", "80")));
        assert_eq!(split_host_port(":80"), Ok(("", "80")));
        assert_eq!(split_host_port("host:"), Ok(("host", "")));
        assert_eq!(split_host_port("[]:80"), Ok(("", "80")));
    }

    #[test]
    fn test_split_host_port_errors() {
        assert!(matches!(split_host_port("localhost"), Err(AddrParseError::MissingPort(_))));
        assert!(matches!(split_host_port("[::1]"), Err(AddrParseError::MissingPort(_))));
        assert!(matches!(split_host_port("[::1]x:80"), Err(AddrParseError::MissingPort(_))));
        assert!(matches!(split_host_port("::1"), Err(AddrParseError::TooManyColons(_))));
        assert!(matches!(split_host_port("[::1]::80"), Err(AddrParseError::TooManyColons(_))));
        assert!(matches!(split_host_port("[::1:80"), Err(AddrParseError::MissingBracket(_))));
        assert_eq!(
            split_host_port("a[b:80"),
            Err(AddrParseError::UnexpectedBracket {
                address: "a[b:80".to_string(),
                bracket: '[',
            })
        );
        assert!(matches!(
            split_host_port("a]b:80"),
            Err(AddrParseError::UnexpectedBracket { bracket: ']', .. })
        ));
    }

    #[test]
    fn test_join_host_port() {
        assert_eq!(join_host_port("", "80"), ":80");
        assert_eq!(join_host_port("example.com", "443"), "example.com:443");
        assert_eq!(join_host_port("::", "8000"), "[::]:8000");
    }
}
