//! Static tile catalog: one immutable [`TileDef`] per terrain kind, created
//! once at tileset build time and never mutated.

/// Terrain classification of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TerrainKind {
    Water,
    Grass,
    Forest,
    Mountain,
    Desert,
    City,
    Road,
    Snow,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 8] = [
        TerrainKind::Water,
        TerrainKind::Grass,
        TerrainKind::Forest,
        TerrainKind::Mountain,
        TerrainKind::Desert,
        TerrainKind::City,
        TerrainKind::Road,
        TerrainKind::Snow,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TerrainKind::Water => "Water",
            TerrainKind::Grass => "Grass",
            TerrainKind::Forest => "Forest",
            TerrainKind::Mountain => "Mountain",
            TerrainKind::Desert => "Desert",
            TerrainKind::City => "City",
            TerrainKind::Road => "Road",
            TerrainKind::Snow => "Snow",
        }
    }
}

/// Immutable catalog entry describing one tile type.
#[derive(Clone, Copy, Debug)]
pub struct TileDef {
    pub id: u8,
    pub kind: TerrainKind,
    pub walkable: bool,
    pub move_cost: f32,
    /// Visual extrusion class; 0 renders flat, higher values get taller
    /// side faces in the tileset.
    pub height_class: u8,
}

/// The full tile catalog. Ids are indices into `defs`, so every id below
/// `len()` is valid and grid cells hold plain `u8` ids.
pub struct TileCatalog {
    defs: Vec<TileDef>,
}

impl TileCatalog {
    pub fn new() -> Self {
        let mut defs = Vec::with_capacity(TerrainKind::ALL.len());
        for (i, &kind) in TerrainKind::ALL.iter().enumerate() {
            let (walkable, move_cost, height_class) = match kind {
                TerrainKind::Water => (false, 0.0, 0),
                TerrainKind::Grass => (true, 1.0, 1),
                TerrainKind::Forest => (true, 1.5, 1),
                TerrainKind::Mountain => (false, 3.0, 3),
                TerrainKind::Desert => (true, 2.0, 1),
                TerrainKind::City => (true, 1.0, 2),
                TerrainKind::Road => (true, 0.5, 1),
                TerrainKind::Snow => (true, 2.5, 4),
            };
            defs.push(TileDef {
                id: i as u8,
                kind,
                walkable,
                move_cost,
                height_class,
            });
        }
        Self { defs }
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Look up a def by id. A grid cell holding an id outside the catalog is
    /// malformed data; callers skip such cells rather than raising.
    pub fn get(&self, id: u8) -> Option<&TileDef> {
        self.defs.get(id as usize)
    }

    pub fn id_for(&self, kind: TerrainKind) -> u8 {
        self.defs
            .iter()
            .find(|d| d.kind == kind)
            .map(|d| d.id)
            .expect("catalog covers every terrain kind")
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileDef> {
        self.defs.iter()
    }
}

impl Default for TileCatalog {
    fn default() -> Self {
        Self::new()
    }
}
