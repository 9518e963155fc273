//! Per-tick cell-flip delta derivation and wire packing (component G).

use crate::matrix::TerritoryMatrix;
use crate::registry::NationIndex;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NationDelta {
    pub add: Vec<(u32, u32)>,
    pub sub: Vec<(u32, u32)>,
}

impl NationDelta {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.sub.is_empty()
    }
}

/// One [`NationDelta`] per nation slot, indexed by [`NationIndex`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeltaSet {
    pub per_nation: Vec<NationDelta>,
}

impl DeltaSet {
    pub fn for_nation(&self, n: NationIndex) -> Option<&NationDelta> {
        if n < 0 {
            return None;
        }
        self.per_nation.get(n as usize)
    }
}

/// Diffs `prev_ownership` against `ownership`; O(cells changed). Every
/// differing cell contributes one `sub` entry to its former owner and one
/// `add` entry to its new owner (either side may be `UNOWNED`, contributing
/// nothing to that side).
pub fn derive_deltas(matrix: &TerritoryMatrix) -> DeltaSet {
    let mut per_nation = vec![NationDelta::default(); matrix.nation_capacity];
    for i in 0..matrix.cells() {
        let before = matrix.prev_ownership[i];
        let after = matrix.ownership[i];
        if before == after {
            continue;
        }
        let x = (i % matrix.width as usize) as u32;
        let y = (i / matrix.width as usize) as u32;
        if before >= 0 {
            per_nation[before as usize].sub.push((x, y));
        }
        if after >= 0 {
            per_nation[after as usize].add.push((x, y));
        }
    }
    DeltaSet { per_nation }
}

const BASE36_DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut n: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).expect("base36 digits are ASCII")
}

fn from_base36(s: &str) -> Option<u32> {
    let mut value: u32 = 0;
    for c in s.bytes() {
        let digit = match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'z' => c - b'a' + 10,
            b'A'..=b'Z' => c - b'A' + 10,
            _ => return None,
        };
        value = value.checked_mul(36)?.checked_add(digit as u32)?;
    }
    Some(value)
}

fn pack_coords(coords: &[(u32, u32)]) -> String {
    coords
        .iter()
        .map(|(x, y)| format!("{},{}", to_base36(*x), to_base36(*y)))
        .collect::<Vec<_>>()
        .join(";")
}

fn unpack_coords(s: &str) -> Option<Vec<(u32, u32)>> {
    if s.is_empty() {
        return Some(Vec::new());
    }
    s.split(';')
        .map(|pair| {
            let (x, y) = pair.split_once(',')?;
            Some((from_base36(x)?, from_base36(y)?))
        })
        .collect()
}

/// `"a:x1,y1;x2,y2|s:x3,y3"`; `None` when both sets are empty ("no changes").
pub fn pack_text(delta: &NationDelta) -> Option<String> {
    if delta.is_empty() {
        return None;
    }
    let mut parts = Vec::new();
    if !delta.add.is_empty() {
        parts.push(format!("a:{}", pack_coords(&delta.add)));
    }
    if !delta.sub.is_empty() {
        parts.push(format!("s:{}", pack_coords(&delta.sub)));
    }
    Some(parts.join("|"))
}

pub fn unpack_text(packed: &str) -> Option<NationDelta> {
    let mut delta = NationDelta::default();
    for segment in packed.split('|') {
        let (tag, body) = segment.split_once(':')?;
        let coords = unpack_coords(body)?;
        match tag {
            "a" => delta.add = coords,
            "s" => delta.sub = coords,
            _ => return None,
        }
    }
    Some(delta)
}

/// `[addCount:u16, subCount:u16, add-pairs as u16 x,y …, sub-pairs …]`,
/// base64-encoded. `None` when both sets are empty.
pub fn pack_binary(delta: &NationDelta) -> Option<String> {
    if delta.is_empty() {
        return None;
    }
    let mut bytes = Vec::with_capacity(4 + (delta.add.len() + delta.sub.len()) * 4);
    bytes.extend_from_slice(&(delta.add.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(delta.sub.len() as u16).to_le_bytes());
    for (x, y) in &delta.add {
        bytes.extend_from_slice(&(*x as u16).to_le_bytes());
        bytes.extend_from_slice(&(*y as u16).to_le_bytes());
    }
    for (x, y) in &delta.sub {
        bytes.extend_from_slice(&(*x as u16).to_le_bytes());
        bytes.extend_from_slice(&(*y as u16).to_le_bytes());
    }
    Some(BASE64.encode(bytes))
}

pub fn unpack_binary(packed: &str) -> Option<NationDelta> {
    let bytes = BASE64.decode(packed).ok()?;
    if bytes.len() < 4 {
        return None;
    }
    let add_count = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
    let sub_count = u16::from_le_bytes([bytes[2], bytes[3]]) as usize;
    let expected_len = 4 + (add_count + sub_count) * 4;
    if bytes.len() != expected_len {
        return None;
    }
    let mut cursor = 4;
    let add = (0..add_count).map(|_| read_pair(&bytes, &mut cursor)).collect();
    let sub = (0..sub_count).map(|_| read_pair(&bytes, &mut cursor)).collect();
    Some(NationDelta { add, sub })
}

fn read_pair(bytes: &[u8], cursor: &mut usize) -> (u32, u32) {
    let x = u16::from_le_bytes([bytes[*cursor], bytes[*cursor + 1]]) as u32;
    let y = u16::from_le_bytes([bytes[*cursor + 2], bytes[*cursor + 3]]) as u32;
    *cursor += 4;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_add_and_sub_from_ownership_diff() {
        let mut m = TerritoryMatrix::new(3, 1, 2);
        m.registry.allocate("A").unwrap();
        m.registry.allocate("B").unwrap();
        m.set_owner(0, 0, 0);
        m.snapshot_ownership();
        m.set_owner(0, 0, 1);
        m.set_owner(1, 0, 0);
        let deltas = derive_deltas(&m);
        assert_eq!(deltas.per_nation[0].sub, vec![(0, 0)]);
        assert_eq!(deltas.per_nation[0].add, vec![(1, 0)]);
        assert_eq!(deltas.per_nation[1].add, vec![(0, 0)]);
    }

    #[test]
    fn no_changes_packs_to_none() {
        let delta = NationDelta::default();
        assert!(pack_text(&delta).is_none());
        assert!(pack_binary(&delta).is_none());
    }

    #[test]
    fn text_round_trip() {
        let delta = NationDelta { add: vec![(1, 2), (40, 0)], sub: vec![(3, 3)] };
        let packed = pack_text(&delta).unwrap();
        assert_eq!(unpack_text(&packed).unwrap(), delta);
    }

    #[test]
    fn binary_round_trip() {
        let delta = NationDelta { add: vec![(1, 2), (40, 0)], sub: vec![(3, 3)] };
        let packed = pack_binary(&delta).unwrap();
        assert_eq!(unpack_binary(&packed).unwrap(), delta);
    }

    #[test]
    fn delta_closure_matches_new_territory() {
        let mut m = TerritoryMatrix::new(3, 1, 1);
        m.registry.allocate("A").unwrap();
        m.set_owner(0, 0, 0);
        m.snapshot_ownership();
        m.set_owner(1, 0, 0);
        let deltas = derive_deltas(&m);
        let mut territory: std::collections::HashSet<_> = [(0u32, 0u32)].into_iter().collect();
        for cell in &deltas.per_nation[0].add {
            territory.insert(*cell);
        }
        for cell in &deltas.per_nation[0].sub {
            territory.remove(cell);
        }
        let expected: std::collections::HashSet<_> = [(0, 0), (1, 0)].into_iter().collect();
        assert_eq!(territory, expected);
    }
}
