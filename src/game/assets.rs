use bevy::{
    prelude::*,
    render::texture::{ImageLoaderSettings, ImageSampler},
    utils::HashMap,
};

pub(super) fn plugin(app: &mut App) {
    app.register_type::<HandleMap<ImageKey>>();
    app.init_resource::<HandleMap<ImageKey>>();

    app.register_type::<HandleMap<SfxKey>>();
    app.init_resource::<HandleMap<SfxKey>>();
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Reflect)]
pub enum ImageKey {
    BoardTiles,
}

impl AssetKey for ImageKey {
    type Asset = Image;

    fn path(self) -> &'static str {
        match self {
            ImageKey::BoardTiles => "images/tiles.png",
        }
    }
}

impl FromWorld for HandleMap<ImageKey> {
    fn from_world(world: &mut World) -> Self {
        let asset_server = world.resource::<AssetServer>();
        [(
            ImageKey::BoardTiles,
            asset_server.load_with_settings(
                ImageKey::BoardTiles.path(),
                |settings: &mut ImageLoaderSettings| {
                    settings.sampler = ImageSampler::nearest();
                },
            ),
        )]
        .into()
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Reflect)]
pub enum SfxKey {
    Eating,
    Crash,
}

impl AssetKey for SfxKey {
    type Asset = AudioSource;

    fn path(self) -> &'static str {
        match self {
            SfxKey::Eating => "audio/sfx/eating.wav",
            SfxKey::Crash => "audio/sfx/crash.wav",
        }
    }
}

impl FromWorld for HandleMap<SfxKey> {
    fn from_world(world: &mut World) -> Self {
        let asset_server = world.resource::<AssetServer>();
        [
            (SfxKey::Eating, asset_server.load(SfxKey::Eating.path())),
            (SfxKey::Crash, asset_server.load(SfxKey::Crash.path())),
        ]
        .into()
    }
}

pub trait AssetKey: Sized {
    type Asset: Asset;

    /// Location under the `assets/` directory.
    fn path(self) -> &'static str;
}

#[derive(Resource, Reflect, Deref, DerefMut)]
#[reflect(Resource)]
pub struct HandleMap<K: AssetKey>(HashMap<K, Handle<K::Asset>>);

impl<K: AssetKey, T> From<T> for HandleMap<K>
where
    T: Into<HashMap<K, Handle<K::Asset>>>,
{
    fn from(value: T) -> Self {
        Self(value.into())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_bundled_assets_exist() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
        let paths = [ImageKey::BoardTiles.path(), SfxKey::Eating.path(), SfxKey::Crash.path()];
        for path in paths {
            assert!(root.join(path).is_file(), "missing assets/{path}");
        }
    }
}
