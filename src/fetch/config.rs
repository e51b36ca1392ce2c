use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use skigraph::overpass::DEFAULT_ENDPOINTS;

/// French resorts scraped when no config file names any
const DEFAULT_STATIONS: &[&str] = &[
    "Abondance",
    "Aillon-Margériaz",
    "Albiez-Montrond",
    "Ancelle",
    "Arâches-la-Frasse",
    "Artouste",
    "Ascou",
    "Auron",
    "Aussois",
    "Autrans",
    "Ax 3 Domaines",
    "Ballon d'Alsace",
    "Barèges",
    "Bernex",
    "Bonneval-sur-Arc",
    "Bourg d'Oueil",
    "Bussang",
    "Camurac",
    "Cauterets",
    "Chabanon",
    "Chamonix-Mont-Blanc",
    "Chapelle-des-Bois",
    "Châtel",
    "Cluses",
    "Col de Plainpalais",
    "Col de Porte",
    "Combloux",
    "Courchevel",
    "Crest-Voland",
    "Crévoux",
    "Domaine skiable Valberg",
    "Dévoluy",
    "Flaine",
    "Flumet",
    "Font-Romeu Pyrénées 2000",
    "Formiguères",
    "Gavarnie-Gèdre",
    "Gérardmer",
    "Giron",
    "Gourette",
    "Grand Tourmalet",
    "Hautacam",
    "Hirmentaz - Les Habères",
    "Isola 2000",
    "La Bresse",
    "La Chapelle d'Abondance",
    "La Clusaz",
    "La Colmiane",
    "La Croix de Bauzon",
    "La Giettaz",
    "La Norma",
    "La Plagne",
    "La Quillane",
    "La Rosière",
    "Le Boréon",
    "Le Champ du Feu",
    "Le Corbier",
    "Le Grand Domaine",
    "Le Grand Puy",
    "Le Grand-Bornand",
    "Le Lioran",
    "Le Mourtis",
    "Le Reposoir",
    "Le Sauze",
    "Le Semnoz",
    "Le Somport",
    "Les Angles",
    "Les Contamines-Montjoie",
    "Les Deux Alpes",
    "Les Estables",
    "Les Fourgs",
    "Les Gets",
    "Les Houches",
    "Les Karellis",
    "Les Monts d'Olmes",
    "Les Orres",
    "Les Portes du Mont-Blanc",
    "Les Rousses",
    "Les Sybelles",
    "Luchon-Superbagnères",
    "Luz Ardiden",
    "Manigod",
    "Massif des Brasses",
    "Megève",
    "Menthières",
    "Mijoux - La Faucille",
    "Métabief",
    "Méaudre",
    "Montgenèvre",
    "Morillon",
    "Morzine",
    "Nistos",
    "Notre-Dame-de-Bellecombe",
    "Peyragudes",
    "Porté-Puymorens",
    "Pralognan-la-Vanoise",
    "Praz de Lys Sommand",
    "Praz-sur-Arly",
    "Puy-Saint-Vincent",
    "Puyvalador",
    "Ratery",
    "Réallon",
    "Risoul",
    "Roc d'Enfer",
    "Rouge Gazon",
    "Saint-Colomban-des-Villards",
    "Saint-François-Longchamp",
    "Saint-Gervais-les-Bains",
    "Saint-Jean-d'Arves",
    "Saint-Laurent-en-Grandvaux",
    "Saint-Nizier-du-Moucherotte",
    "Saint-Pierre-de-Chartreuse",
    "Saint-Sorlin-d'Arves",
    "Sainte-Foy-Tarentaise",
    "Sallanches",
    "Samoëns",
    "Serre Chevalier",
    "Sixt-Fer-à-Cheval",
    "Stade de neige du Col du Feu",
    "Thollon-les-Mémises",
    "Tignes",
    "Val Cenis",
    "Val Thorens",
    "Val d'Ese",
    "Valfréjus",
    "Valmeinier",
    "Valloire",
    "Vaujany",
    "Ventron",
    "Villard-de-Lans",
];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default = "default_stations")]
    pub stations: Vec<StationConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GlobalConfig {
    /// Overpass mirrors, probed in order
    pub overpass_endpoints: Vec<String>,
    /// Pause between two resort queries
    pub pause_ms: u64,
    pub query_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StationConfig {
    pub name: String,
}

fn default_stations() -> Vec<StationConfig> {
    DEFAULT_STATIONS
        .iter()
        .map(|name| StationConfig {
            name: name.to_string(),
        })
        .collect()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            overpass_endpoints: DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()).collect(),
            pause_ms: 1500,
            query_timeout_secs: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            stations: default_stations(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn station_names(&self) -> Vec<String> {
        self.stations.iter().map(|s| s.name.clone()).collect()
    }
}

impl GlobalConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}
