//! Decoder for the flat object-detection array.
//!
//! Cameras publish detections as one flat `f64` array of fixed-stride
//! records: `id, tx, ty, ta, x0, y0, x1, y1, x2, y2, x3, y3, <reserved>`.
//! A trailing partial record is discarded.

use tagfusion_types::Reading;

/// Values per detection record.
pub const DETECTION_STRIDE: usize = 13;

/// One decoded detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub id: f64,
    pub tx_deg: f64,
    pub ty_deg: f64,
    pub ta_percent: f64,
    pub corners: [f64; 8],
}

impl Detection {
    fn from_record(record: &[f64]) -> Self {
        let mut corners = [0.0; 8];
        corners.copy_from_slice(&record[4..12]);
        Self {
            id: record[0],
            tx_deg: record[1],
            ty_deg: record[2],
            ta_percent: record[3],
            corners,
        }
    }

    pub fn reading(&self) -> Reading {
        Reading {
            tx_deg: self.tx_deg,
            ty_deg: self.ty_deg,
            ta_percent: self.ta_percent,
        }
    }
}

/// Decode every complete record in `data`.
pub fn decode(data: &[f64]) -> Vec<Detection> {
    data.chunks_exact(DETECTION_STRIDE)
        .map(Detection::from_record)
        .collect()
}

/// Decode only the first complete record.
pub fn first(data: &[f64]) -> Option<Detection> {
    data.chunks_exact(DETECTION_STRIDE)
        .next()
        .map(Detection::from_record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: f64) -> Vec<f64> {
        let mut r = vec![id, 1.5, -2.0, 0.8];
        r.extend_from_slice(&[10.0, 20.0, 30.0, 20.0, 30.0, 40.0, 10.0, 40.0]);
        r.push(0.0);
        r
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(decode(&[]).is_empty());
        assert!(first(&[]).is_none());
    }

    #[test]
    fn decodes_fields_in_order() {
        let d = first(&record(3.0)).unwrap();
        assert_eq!(d.id, 3.0);
        assert_eq!(d.tx_deg, 1.5);
        assert_eq!(d.ty_deg, -2.0);
        assert_eq!(d.ta_percent, 0.8);
        assert_eq!(d.corners, [10.0, 20.0, 30.0, 20.0, 30.0, 40.0, 10.0, 40.0]);
    }

    #[test]
    fn trailing_partial_record_is_dropped() {
        let mut data = record(1.0);
        data.extend(record(2.0));
        data.extend_from_slice(&[9.0, 9.0, 9.0, 9.0, 9.0]);
        let all = decode(&data);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].id, 2.0);
    }

    #[test]
    fn short_input_has_no_first() {
        assert!(first(&record(1.0)[..12]).is_none());
    }
}
