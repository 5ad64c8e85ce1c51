//! Left/right joint naming.
//!
//! Skeleton templates mark symmetric joints with a side suffix. The meta-rig
//! uses `.L`/`.R` (optionally followed by a `.001` style chain index), other
//! conventions use `_L`/`_R`, lower-case `.l`/`.r` or a `Left`/`Right` word.

/// Which side of the body a joint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Character's left.
    Left,
    /// Character's right.
    Right,
}

impl Side {
    /// The opposite side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Suffix pairs as (left, right).
const SUFFIXES: [(&str, &str); 4] = [(".L", ".R"), ("_L", "_R"), (".l", ".r"), ("Left", "Right")];

/// Split a trailing `.NNN` chain index off a name.
fn split_chain_index(name: &str) -> (&str, &str) {
    if let Some(pos) = name.rfind('.') {
        let tail = &name[pos + 1..];
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            return (&name[..pos], &name[pos..]);
        }
    }
    (name, "")
}

/// Detect the side marker at the end of a joint name.
///
/// A trailing chain index is ignored, so `lip.T.R.001` is a right-side name.
pub fn side_of(name: &str) -> Option<Side> {
    let (stem, _) = split_chain_index(name);
    for (left, right) in SUFFIXES {
        if stem.ends_with(right) {
            return Some(Side::Right);
        }
        if stem.ends_with(left) {
            return Some(Side::Left);
        }
    }
    None
}

/// Whether the name (ignoring any chain index) ends with a right-side marker.
pub fn is_right(name: &str) -> bool {
    side_of(name) == Some(Side::Right)
}

/// Swap the side marker of a joint name.
///
/// Returns `None` for names without a side marker.
///
/// ```
/// use metarig::skeleton::mirror_name;
///
/// assert_eq!(mirror_name("lip.T.R.001").as_deref(), Some("lip.T.L.001"));
/// assert_eq!(mirror_name("hand_L").as_deref(), Some("hand_R"));
/// assert_eq!(mirror_name("spine.003"), None);
/// ```
pub fn mirror_name(name: &str) -> Option<String> {
    let (stem, index) = split_chain_index(name);
    for (left, right) in SUFFIXES {
        if let Some(base) = stem.strip_suffix(right) {
            return Some(format!("{}{}{}", base, left, index));
        }
        if let Some(base) = stem.strip_suffix(left) {
            return Some(format!("{}{}{}", base, right, index));
        }
    }
    None
}

/// Rewrite a `.L` meta-rig name and an `l_` prefixed source name for `side`.
///
/// Built-in tables are declared once for the left side; this produces the
/// right-side twin of each name.
pub(crate) fn sided(name: &str, side: Side) -> String {
    match side {
        Side::Left => name.to_string(),
        Side::Right => {
            if let Some(rest) = name.strip_prefix("l_") {
                format!("r_{}", rest)
            } else if let Some(rest) = name.strip_prefix("-l_") {
                format!("-r_{}", rest)
            } else {
                mirror_name(name).unwrap_or_else(|| name.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_detection() {
        assert_eq!(side_of("upper_arm.L"), Some(Side::Left));
        assert_eq!(side_of("lid.B.R.003"), Some(Side::Right));
        assert_eq!(side_of("HandRight"), Some(Side::Right));
        assert_eq!(side_of("spine.006"), None);
        assert_eq!(side_of("jaw"), None);
        assert!(is_right("brow.T.R"));
        assert!(!is_right("brow.T.L"));
    }

    #[test]
    fn test_mirror_round_trip() {
        for name in ["cheek.T.R.001", "thigh.L", "foot_R", "EyeLeft"] {
            let mirrored = mirror_name(name).unwrap();
            assert_ne!(mirrored, name);
            assert_eq!(mirror_name(&mirrored).unwrap(), name);
        }
    }

    #[test]
    fn test_sided() {
        assert_eq!(sided("l_hand", Side::Right), "r_hand");
        assert_eq!(sided("-l_index1", Side::Right), "-r_index1");
        assert_eq!(sided("palm.01.L", Side::Right), "palm.01.R");
        assert_eq!(sided("palm.01.L", Side::Left), "palm.01.L");
    }
}
