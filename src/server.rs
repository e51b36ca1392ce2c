//! Helpers shared by the HTTP binaries.

/// Swap the port of `listen` for `port` when one is given (the `PORT`
/// variable set by container platforms). The host part is kept.
pub fn listen_address(listen: &str, port: Option<u16>) -> String {
    match port {
        Some(port) => {
            let host = listen.rsplit_once(':').map_or(listen, |(host, _)| host);
            format!("{}:{}", host, port)
        }
        None => listen.to_string(),
    }
}
