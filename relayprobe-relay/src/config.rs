use std::net::{Ipv4Addr, SocketAddr};

/// Address the stub relay binds when none is given.
pub const DEFAULT_ADDRESS: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);

/// NOTICE text sent back for frames that are not subscription requests.
pub const UNSUPPORTED_NOTICE: &str = "unsupported message";
