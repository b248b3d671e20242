//! Endpoint allowlist for the YouTube Data API v3
//!
//! The set of upstream operations this project may call is closed and fixed at
//! compile time. There is no way to extend it at runtime: adding an endpoint is
//! a code change. Every request names its endpoint by string and is checked
//! against this table by exact, case-sensitive match before any URL is built.

/// HTTP method used by an endpoint. All allowlisted endpoints are read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
        }
    }
}

/// Describes one permitted upstream operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Name callers use to select the endpoint (e.g. `playlistItems`)
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path segment appended to the fixed base path
    pub path: &'static str,
    /// Estimated quota units charged by the upstream per call
    pub unit_cost: u64,
}

/// Quota cost of a typical read (`*.list`) call
pub const QUOTA_COST_READ: u64 = 1;

/// Quota cost of a `search.list` call
pub const QUOTA_COST_SEARCH: u64 = 100;

pub const CHANNELS: EndpointDescriptor = EndpointDescriptor {
    name: "channels",
    method: HttpMethod::Get,
    path: "channels",
    unit_cost: QUOTA_COST_READ,
};

pub const PLAYLISTS: EndpointDescriptor = EndpointDescriptor {
    name: "playlists",
    method: HttpMethod::Get,
    path: "playlists",
    unit_cost: QUOTA_COST_READ,
};

pub const PLAYLIST_ITEMS: EndpointDescriptor = EndpointDescriptor {
    name: "playlistItems",
    method: HttpMethod::Get,
    path: "playlistItems",
    unit_cost: QUOTA_COST_READ,
};

pub const VIDEOS: EndpointDescriptor = EndpointDescriptor {
    name: "videos",
    method: HttpMethod::Get,
    path: "videos",
    unit_cost: QUOTA_COST_READ,
};

pub const SEARCH: EndpointDescriptor = EndpointDescriptor {
    name: "search",
    method: HttpMethod::Get,
    path: "search",
    unit_cost: QUOTA_COST_SEARCH,
};

pub const COMMENT_THREADS: EndpointDescriptor = EndpointDescriptor {
    name: "commentThreads",
    method: HttpMethod::Get,
    path: "commentThreads",
    unit_cost: QUOTA_COST_READ,
};

/// The complete allowlist. Keep this tight.
pub const ALLOWED_ENDPOINTS: [EndpointDescriptor; 6] = [
    CHANNELS,
    PLAYLISTS,
    PLAYLIST_ITEMS,
    VIDEOS,
    SEARCH,
    COMMENT_THREADS,
];

/// Look up an endpoint by exact name
pub fn lookup(name: &str) -> Option<&'static EndpointDescriptor> {
    ALLOWED_ENDPOINTS.iter().find(|e| e.name == name)
}

/// Returns true only when `name` exactly matches an allowlisted endpoint
pub fn is_allowed(name: &str) -> bool {
    lookup(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_allowlisted_endpoints_are_allowed() {
        for endpoint in ALLOWED_ENDPOINTS.iter() {
            assert!(is_allowed(endpoint.name), "{} should be allowed", endpoint.name);
        }
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        assert!(!is_allowed("activities"));
        assert!(!is_allowed("liveBroadcasts"));
        assert!(!is_allowed(""));
    }

    #[test]
    fn test_similar_names_rejected() {
        assert!(!is_allowed("Channels"));
        assert!(!is_allowed("channels "));
        assert!(!is_allowed(" videos"));
        assert!(!is_allowed("playlistitems"));
        assert!(!is_allowed("videos/../channels"));
        assert!(!is_allowed("search?key=x"));
        assert!(!is_allowed("commentThread"));
    }

    #[test]
    fn test_search_is_expensive() {
        assert_eq!(lookup("search").unwrap().unit_cost, QUOTA_COST_SEARCH);
        assert_eq!(lookup("videos").unwrap().unit_cost, QUOTA_COST_READ);
        assert!(QUOTA_COST_SEARCH >= 100 * QUOTA_COST_READ);
    }

    #[test]
    fn test_endpoints_are_get_only() {
        assert!(ALLOWED_ENDPOINTS
            .iter()
            .all(|e| e.method == HttpMethod::Get));
    }
}
