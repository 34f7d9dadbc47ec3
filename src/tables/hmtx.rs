//! `hmtx`/`vmtx` — per-glyph metrics (spec §4.3). The table is dense up to
//! `metricCount` entries, then extends with side-bearing-only entries that
//! inherit the last advance (spec §3 invariants).

use crate::error::Result;
use crate::reader::Reader;

#[derive(Copy, Clone, Debug)]
pub struct Metric {
    pub advance: u16,
    pub side_bearing: i16,
}

#[derive(Clone, Debug)]
pub struct MetricsTable {
    pub metrics: Vec<Metric>,
}

impl MetricsTable {
    pub fn parse(r: &mut Reader, metric_count: u16, glyph_count: u16) -> Result<MetricsTable> {
        let mut metrics = Vec::with_capacity(glyph_count as usize);
        for _ in 0..metric_count {
            metrics.push(Metric { advance: r.u16()?, side_bearing: r.i16()? });
        }
        let last_advance = metrics.last().map(|m| m.advance).unwrap_or(0);
        for _ in metric_count..glyph_count {
            metrics.push(Metric { advance: last_advance, side_bearing: r.i16()? });
        }
        Ok(MetricsTable { metrics })
    }

    pub fn get(&self, glyph_index: u16) -> Metric {
        self.metrics.get(glyph_index as usize).copied().unwrap_or(Metric { advance: 0, side_bearing: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::builder::hmtx_table;

    #[test]
    fn dense_entries_read_back() {
        let data = hmtx_table(&[(500, 10), (600, -5)]);
        let mut r = Reader::new(&data);
        let m = MetricsTable::parse(&mut r, 2, 2).unwrap();
        assert_eq!(m.get(0).advance, 500);
        assert_eq!(m.get(1).side_bearing, -5);
    }

    #[test]
    fn trailing_entries_inherit_last_advance() {
        let mut data = hmtx_table(&[(500, 10)]);
        data.extend_from_slice(&3i16.to_be_bytes()); // lsb-only entry for glyph 1
        let mut r = Reader::new(&data);
        let m = MetricsTable::parse(&mut r, 1, 2).unwrap();
        assert_eq!(m.get(1).advance, 500);
        assert_eq!(m.get(1).side_bearing, 3);
    }
}
