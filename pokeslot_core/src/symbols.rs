use serde::{Deserialize, Serialize};

/// Symbol code as it appears on a board and on the wire.
pub type SymbolCode = u8;

/// The classic six-tile set. Codes start at 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Tile {
    Bulbasaur,
    Pikachu,
    Charmander,
    Squirtle,
    Eevee,
    Ball,
}

impl Tile {
    pub const ALL: [Tile; 6] = [
        Tile::Bulbasaur,
        Tile::Pikachu,
        Tile::Charmander,
        Tile::Squirtle,
        Tile::Eevee,
        Tile::Ball,
    ];

    pub fn from_code(code: SymbolCode) -> Option<Self> {
        match code {
            1 => Some(Tile::Bulbasaur),
            2 => Some(Tile::Pikachu),
            3 => Some(Tile::Charmander),
            4 => Some(Tile::Squirtle),
            5 => Some(Tile::Eevee),
            6 => Some(Tile::Ball),
            _ => None,
        }
    }

    pub fn to_code(self) -> SymbolCode {
        match self {
            Tile::Bulbasaur => 1,
            Tile::Pikachu => 2,
            Tile::Charmander => 3,
            Tile::Squirtle => 4,
            Tile::Eevee => 5,
            Tile::Ball => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tile::Bulbasaur => "bulbasaur",
            Tile::Pikachu => "pikachu",
            Tile::Charmander => "charmander",
            Tile::Squirtle => "squirtle",
            Tile::Eevee => "eevee",
            Tile::Ball => "ball",
        }
    }
}

/// Ordered set of symbol codes a board may be filled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolSet {
    codes: Vec<SymbolCode>,
}

impl SymbolSet {
    /// The six classic tiles.
    pub fn classic() -> Self {
        Self {
            codes: Tile::ALL.iter().map(|t| t.to_code()).collect(),
        }
    }

    /// Codes `1..=count`. Counts above `u8::MAX` are truncated to it.
    pub fn first(count: usize) -> Self {
        let count = count.min(SymbolCode::MAX as usize) as SymbolCode;
        Self {
            codes: (1..=count).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn contains(&self, code: SymbolCode) -> bool {
        self.codes.contains(&code)
    }

    /// Code at `index`; callers draw `index` from `[0, len)`.
    pub fn code_at(&self, index: usize) -> SymbolCode {
        self.codes[index]
    }

    pub fn codes(&self) -> &[SymbolCode] {
        &self.codes
    }
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_codes_round_trip() {
        for tile in Tile::ALL {
            assert_eq!(Tile::from_code(tile.to_code()), Some(tile));
        }
        assert_eq!(Tile::from_code(0), None);
        assert_eq!(Tile::from_code(7), None);
    }

    #[test]
    fn first_n_matches_classic_prefix() {
        assert_eq!(SymbolSet::first(6), SymbolSet::classic());
        let five = SymbolSet::first(5);
        assert_eq!(five.codes(), &[1, 2, 3, 4, 5]);
        assert!(!five.contains(0));
        assert!(!five.contains(6));
    }
}
