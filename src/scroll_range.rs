use anyhow::{anyhow, Result};

/// Step used when a range gives none, in px
pub const DEFAULT_STEP: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollRange {
    pub start: ScrollRef,
    pub end: Option<ScrollRef>,
    pub step: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollRef {
    Pixels(u32),
    /// Percentage of the maximum scroll offset
    Percent(u32),
    End,
}

impl ScrollRange {
    /// Parse a scroll specification like "500", "25%", "0-end", "0-2000/250"
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Empty scroll range"));
        }

        let (range_part, step) = match s.split_once('/') {
            Some((range, step)) => {
                let step = step
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| anyhow!("Invalid step: {}", step))?;
                if step == 0 {
                    return Err(anyhow!("Step must be >= 1"));
                }
                (range.trim(), Some(step))
            }
            None => (s, None),
        };

        if let Some(dash_pos) = range_part.find('-') {
            // "-5" would be a negative offset
            if dash_pos == 0 {
                return Err(anyhow!("Invalid scroll range: {}", s));
            }

            let start = parse_scroll_ref(&range_part[..dash_pos])?;
            let end = parse_scroll_ref(&range_part[dash_pos + 1..])?;

            Ok(ScrollRange {
                start,
                end: Some(end),
                step,
            })
        } else {
            if step.is_some() {
                return Err(anyhow!("A step needs a range: {}", s));
            }
            Ok(ScrollRange {
                start: parse_scroll_ref(range_part)?,
                end: None,
                step: None,
            })
        }
    }

    /// Expand this range into scroll offsets, given the largest offset the
    /// viewport accepts
    pub fn expand(&self, max_scroll: f64) -> Result<Vec<f64>> {
        let start = resolve(&self.start, max_scroll)?;
        let end = match &self.end {
            Some(end) => resolve(end, max_scroll)?,
            None => return Ok(vec![start]),
        };
        let step = f64::from(self.step.unwrap_or(DEFAULT_STEP));

        let mut offsets = Vec::new();
        let mut current = start;
        if start <= end {
            while current < end {
                offsets.push(current);
                current += step;
            }
        } else {
            while current > end {
                offsets.push(current);
                current -= step;
            }
        }
        offsets.push(end);

        Ok(offsets)
    }
}

fn resolve(scroll_ref: &ScrollRef, max_scroll: f64) -> Result<f64> {
    match scroll_ref {
        ScrollRef::Pixels(px) => {
            let px = f64::from(*px);
            if px > max_scroll {
                return Err(anyhow!(
                    "Offset {}px exceeds maximum scroll {}px",
                    px,
                    max_scroll
                ));
            }
            Ok(px)
        }
        ScrollRef::Percent(pct) => Ok(max_scroll * f64::from(*pct) / 100.0),
        ScrollRef::End => Ok(max_scroll),
    }
}

fn parse_scroll_ref(s: &str) -> Result<ScrollRef> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("end") {
        Ok(ScrollRef::End)
    } else if let Some(pct) = s.strip_suffix('%') {
        let pct = pct
            .trim()
            .parse::<u32>()
            .map_err(|_| anyhow!("Invalid percentage: {}", s))?;
        if pct > 100 {
            return Err(anyhow!("Percentage must be <= 100: {}", s));
        }
        Ok(ScrollRef::Percent(pct))
    } else {
        s.strip_suffix("px")
            .unwrap_or(s)
            .parse::<u32>()
            .map(ScrollRef::Pixels)
            .map_err(|_| anyhow!("Invalid scroll offset: {}", s))
    }
}

/// Parse a comma-separated list of scroll ranges like "0-1000/250,50%,end"
pub fn parse_scroll_ranges(s: &str) -> Result<Vec<ScrollRange>> {
    s.split(',')
        .map(|part| ScrollRange::parse(part.trim()))
        .collect()
}

/// Expand a scroll range string into a list of offsets
pub fn expand_scroll_ranges(s: &str, max_scroll: f64) -> Result<Vec<f64>> {
    let ranges = parse_scroll_ranges(s)?;
    let mut offsets = Vec::new();
    for range in ranges {
        offsets.extend(range.expand(max_scroll)?);
    }
    Ok(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_offset() {
        let range = ScrollRange::parse("500").unwrap();
        assert_eq!(range.start, ScrollRef::Pixels(500));
        assert_eq!(range.end, None);
        assert_eq!(range.expand(1000.0).unwrap(), vec![500.0]);
    }

    #[test]
    fn test_px_suffix() {
        let range = ScrollRange::parse("250px").unwrap();
        assert_eq!(range.start, ScrollRef::Pixels(250));
    }

    #[test]
    fn test_stepped_range() {
        let range = ScrollRange::parse("0-1000/250").unwrap();
        assert_eq!(range.step, Some(250));
        assert_eq!(
            range.expand(2000.0).unwrap(),
            vec![0.0, 250.0, 500.0, 750.0, 1000.0]
        );
    }

    #[test]
    fn test_default_step_ends_on_end() {
        let range = ScrollRange::parse("0-250").unwrap();
        assert_eq!(range.expand(1000.0).unwrap(), vec![0.0, 100.0, 200.0, 250.0]);
    }

    #[test]
    fn test_reverse_range() {
        let range = ScrollRange::parse("300-0/150").unwrap();
        assert_eq!(range.expand(1000.0).unwrap(), vec![300.0, 150.0, 0.0]);
    }

    #[test]
    fn test_end_and_percent() {
        let range = ScrollRange::parse("50%-end/250").unwrap();
        assert_eq!(range.start, ScrollRef::Percent(50));
        assert_eq!(range.end, Some(ScrollRef::End));
        assert_eq!(range.expand(1000.0).unwrap(), vec![500.0, 750.0, 1000.0]);
    }

    #[test]
    fn test_comma_separated() {
        let offsets = expand_scroll_ranges("0-200, 50%,end", 1000.0).unwrap();
        assert_eq!(offsets, vec![0.0, 100.0, 200.0, 500.0, 1000.0]);
    }

    #[test]
    fn test_invalid_specs() {
        assert!(ScrollRange::parse("").is_err());
        assert!(ScrollRange::parse("-5").is_err());
        assert!(ScrollRange::parse("0-100/0").is_err());
        assert!(ScrollRange::parse("150%").is_err());
        assert!(ScrollRange::parse("abc").is_err());
        assert!(ScrollRange::parse("100/10").is_err());
    }

    #[test]
    fn test_offset_exceeds_max() {
        let range = ScrollRange::parse("1500").unwrap();
        assert!(range.expand(1000.0).is_err());
    }
}
