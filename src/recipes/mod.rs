//! Recipes: named, idempotent changes applied to a single zone.
//!
//! Recipes are looked up by id in a static registry. They only change the
//! zone's records and SOA parameters, saving is left to the caller (see
//! [`Registry::run`]).
use crate::config::Settings;
use crate::config::ZoneDefaults;
use crate::store::Store;
use crate::Error;
use crate::Result;
use crate::Zone;
use lazy_static::lazy_static;
use log::info;
use std::collections::HashMap;

pub mod mixins;
mod presets;

pub use self::mixins::Preset;
pub use self::presets::GoogleApps;
pub use self::presets::Office365;

/// Every recipe id, in the order they are offered by default.
pub const ALL: &[&str] = &[
    "google_apps",
    "office_365",
    "remove_per_record_ttls",
    "reset_zone_defaults",
    "resave",
    "revalidate",
];

/// What the caller should do with the zone after a recipe was applied.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Apply {
    Save,

    /// Nothing to save.
    Skip,
}

/// What a recipe may use besides the zone.
pub struct Context<'a> {
    pub defaults: &'a ZoneDefaults,
    pub store: &'a dyn Store,
}

pub trait Recipe: Send + Sync {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn apply(&self, zone: &mut Zone, ctx: &Context) -> Result<Apply>;
}

/// Clears every per record TTL, so they all inherit the zone's.
pub struct RemovePerRecordTtls;

impl Recipe for RemovePerRecordTtls {
    fn id(&self) -> &'static str {
        "remove_per_record_ttls"
    }

    fn description(&self) -> &'static str {
        "Reset Record TTLs"
    }

    fn apply(&self, zone: &mut Zone, _ctx: &Context) -> Result<Apply> {
        let changed = zone.set_record_ttls(None);
        info!("{}: cleared {} record TTLs", zone.domain, changed);
        Ok(Apply::Save)
    }
}

/// Resets the SOA timers, default TTL and SOA email.
pub struct ResetZoneDefaults;

impl Recipe for ResetZoneDefaults {
    fn id(&self) -> &'static str {
        "reset_zone_defaults"
    }

    fn description(&self) -> &'static str {
        "Reset Zone Defaults"
    }

    fn apply(&self, zone: &mut Zone, ctx: &Context) -> Result<Apply> {
        zone.reset_defaults(ctx.defaults);
        Ok(Apply::Save)
    }
}

/// Changes nothing, but has the zone saved (and so republished).
pub struct Resave;

impl Recipe for Resave {
    fn id(&self) -> &'static str {
        "resave"
    }

    fn description(&self) -> &'static str {
        "Force Resave / Publish"
    }

    fn apply(&self, _zone: &mut Zone, _ctx: &Context) -> Result<Apply> {
        Ok(Apply::Save)
    }
}

/// Forgets the zone's cached verdicts, so they are checked again.
pub struct Revalidate;

impl Recipe for Revalidate {
    fn id(&self) -> &'static str {
        "revalidate"
    }

    fn description(&self) -> &'static str {
        "Force Revalidation"
    }

    fn apply(&self, zone: &mut Zone, ctx: &Context) -> Result<Apply> {
        ctx.store.invalidate(&zone.domain);
        Ok(Apply::Skip)
    }
}

type Constructor = fn() -> Box<dyn Recipe>;

lazy_static! {
    static ref RECIPES: HashMap<&'static str, Constructor> = {
        let mut m: HashMap<&'static str, Constructor> = HashMap::new();
        m.insert("google_apps", || Box::new(GoogleApps));
        m.insert("office_365", || Box::new(Office365));
        m.insert("remove_per_record_ttls", || Box::new(RemovePerRecordTtls));
        m.insert("reset_zone_defaults", || Box::new(ResetZoneDefaults));
        m.insert("resave", || Box::new(Resave));
        m.insert("revalidate", || Box::new(Revalidate));
        m
    };
}

/// The configured catalog of recipes.
pub struct Registry {
    recipes: Vec<Box<dyn Recipe>>,
    defaults: ZoneDefaults,
}

impl Registry {
    /// Builds the recipes named in `settings.recipes`. An unknown id is a
    /// configuration error.
    pub fn from_settings(settings: &Settings) -> Result<Registry> {
        let recipes = settings
            .recipes
            .iter()
            .map(|id| match RECIPES.get(id.as_str()) {
                Some(new) => Ok(new()),
                None => Err(Error::UnknownRecipe(id.clone())),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Registry {
            recipes,
            defaults: settings.zone_defaults.clone(),
        })
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.recipes.iter().map(|r| r.id()).collect()
    }

    pub fn get(&self, id: &str) -> Result<&dyn Recipe> {
        match self.recipes.iter().find(|r| r.id() == id) {
            Some(recipe) => Ok(recipe.as_ref()),
            None => Err(Error::UnknownRecipe(id.to_string())),
        }
    }

    /// Applies the recipe to `zone`, without saving it.
    pub fn apply(&self, id: &str, zone: &mut Zone, store: &dyn Store) -> Result<Apply> {
        let recipe = self.get(id)?;
        let ctx = Context {
            defaults: &self.defaults,
            store,
        };

        info!("{}: applying recipe {}", zone.domain, id);
        recipe.apply(zone, &ctx)
    }

    /// Loads the zone, applies the recipe, and saves the zone if the recipe
    /// asks for it.
    pub fn run<S: Store>(&self, id: &str, store: &S, domain: &str) -> Result<Apply> {
        // Fail on a bad id before touching the store.
        self.get(id)?;

        let mut zone = match store.get(domain)? {
            Some(zone) => zone,
            None => return Err(Error::NotFound(domain.to_string())),
        };

        let apply = self.apply(id, &mut zone, store)?;
        if apply == Apply::Save {
            store.save(&mut zone)?;
        }

        Ok(apply)
    }
}
