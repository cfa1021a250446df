/// A value paired with a "changed since last sync" flag.
///
/// Editor panels edit the value through [`DirtyFlag::get_all`] and the owner
/// pushes it downstream before calling [`DirtyFlag::clean_flag`].
pub struct DirtyFlag<T> {
    dirty: bool,
    value: T,
}

impl<T> DirtyFlag<T> {
    pub fn new(value: T) -> Self {
        Self { dirty: false, value }
    }

    /// For widgets that report their own `changed()` state.
    pub fn get_all(&mut self) -> (&mut T, &mut bool) {
        (&mut self.value, &mut self.dirty)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clean_flag(&mut self) {
        self.dirty = false;
    }

    /// Replaces the value without marking it dirty, for values pulled from downstream.
    pub fn sync(&mut self, value: T) {
        self.value = value;
        self.dirty = false;
    }
}

/// A named canvas layer, painted and invalidated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Back,
    Main,
    Front,
    Overlay,
}

impl Layer {
    /// Compositing order, bottom first.
    pub const ALL: [Layer; 4] = [Layer::Back, Layer::Main, Layer::Front, Layer::Overlay];

    pub fn name(&self) -> &'static str {
        match self {
            Layer::Back => "back",
            Layer::Main => "main",
            Layer::Front => "front",
            Layer::Overlay => "overlay",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|layer| layer.name() == name)
    }

    fn bit(&self) -> u8 {
        1 << (*self as u8)
    }
}

/// Set of layers waiting for a repaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerSet(u8);

impl LayerSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b1111)
    }

    /// Parses a comma separated list such as `"main,back"`. Unknown names are ignored.
    pub fn parse(names: &str) -> Self {
        names
            .split(',')
            .filter_map(|name| {
                let layer = Layer::from_name(name.trim());
                if layer.is_none() {
                    log::warn!("ignoring unknown layer `{}`", name);
                }
                layer
            })
            .collect()
    }

    pub fn insert(&mut self, layer: Layer) {
        self.0 |= layer.bit();
    }

    pub fn contains(&self, layer: Layer) -> bool {
        self.0 & layer.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(self, other: LayerSet) -> LayerSet {
        LayerSet(self.0 | other.0)
    }

    /// Returns the current set and leaves this one clean.
    pub fn take(&mut self) -> LayerSet {
        std::mem::take(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = Layer> + '_ {
        Layer::ALL.into_iter().filter(move |layer| self.contains(*layer))
    }
}

impl From<Layer> for LayerSet {
    fn from(layer: Layer) -> Self {
        LayerSet(layer.bit())
    }
}

impl<const N: usize> From<[Layer; N]> for LayerSet {
    fn from(layers: [Layer; N]) -> Self {
        layers.into_iter().collect()
    }
}

impl FromIterator<Layer> for LayerSet {
    fn from_iter<I: IntoIterator<Item = Layer>>(iter: I) -> Self {
        let mut set = LayerSet::empty();
        iter.into_iter().for_each(|layer| set.insert(layer));
        set
    }
}

#[cfg(test)]
mod test_dirty_flag {
    use super::*;

    #[test]
    fn test_layer_set() {
        let mut dirty = LayerSet::empty();

        assert!(dirty.is_empty());
        dirty.insert(Layer::Main);
        assert!(dirty.contains(Layer::Main));
        assert!(!dirty.contains(Layer::Back));

        let taken = dirty.take();
        assert!(dirty.is_empty());
        assert_eq!(taken, LayerSet::from(Layer::Main));
    }

    #[test]
    fn test_parse_names() {
        let set = LayerSet::parse("main, back,bogus");
        assert_eq!(set, LayerSet::from([Layer::Back, Layer::Main]));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Layer::Back, Layer::Main]);
    }

    #[test]
    fn test_all_layers() {
        assert_eq!(LayerSet::all().iter().count(), 4);
        assert_eq!(LayerSet::all(), Layer::ALL.into_iter().collect());
        assert_eq!(Layer::from_name("overlay"), Some(Layer::Overlay));
    }

    #[test]
    fn test_dirty_flag() {
        let mut grid = DirtyFlag::new(10.0f32);
        assert!(!grid.is_dirty());

        let (value, dirty) = grid.get_all();
        *value = 1.0;
        *dirty = true;
        assert!(grid.is_dirty());
        grid.clean_flag();
        assert!(!grid.is_dirty());

        let (value, dirty) = grid.get_all();
        *value = 100.0;
        *dirty = true;
        grid.sync(5.0);
        assert!(!grid.is_dirty());
        assert_eq!(*grid.get_all().0, 5.0);
    }
}
