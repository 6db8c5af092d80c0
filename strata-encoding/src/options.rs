/// Options controlling how columns are decoded.
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    /// The number of pages or zone ranges decoded concurrently.
    concurrency: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { concurrency: 16 }
    }
}

impl DecodeOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

/// Options controlling the zone maps written next to leaf columns.
#[derive(Clone, Debug)]
pub struct ZoneMapOptions {
    rows_per_zone: u32,
    /// Binary min/max statistics are truncated to this many bytes.
    max_binary_stat_len: usize,
}

impl Default for ZoneMapOptions {
    fn default() -> Self {
        Self {
            rows_per_zone: 8192,
            max_binary_stat_len: 64,
        }
    }
}

impl ZoneMapOptions {
    pub fn with_rows_per_zone(mut self, rows_per_zone: u32) -> Self {
        self.rows_per_zone = rows_per_zone.max(1);
        self
    }

    pub fn with_max_binary_stat_len(mut self, max_binary_stat_len: usize) -> Self {
        self.max_binary_stat_len = max_binary_stat_len.max(1);
        self
    }

    pub fn rows_per_zone(&self) -> u32 {
        self.rows_per_zone
    }

    pub fn max_binary_stat_len(&self) -> usize {
        self.max_binary_stat_len
    }
}

/// Options controlling how columns are encoded.
#[derive(Clone, Debug)]
pub struct EncodeOptions {
    rows_per_page: usize,
    zone_map: Option<ZoneMapOptions>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            rows_per_page: 64 * 1024,
            zone_map: None,
        }
    }
}

impl EncodeOptions {
    pub fn with_rows_per_page(mut self, rows_per_page: usize) -> Self {
        self.rows_per_page = rows_per_page.max(1);
        self
    }

    pub fn with_zone_map(mut self, zone_map: ZoneMapOptions) -> Self {
        self.zone_map = Some(zone_map);
        self
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn zone_map(&self) -> Option<&ZoneMapOptions> {
        self.zone_map.as_ref()
    }
}
