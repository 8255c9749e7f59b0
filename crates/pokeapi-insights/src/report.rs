//! The standard question set, answered in one pass.

use serde::{Deserialize, Serialize};

use crate::client::PokeClient;
use crate::queries;
use crate::types::{Direction, InsightsResult, Mode, Ranked, SpeciesFilter};

/// Answers to the standard questions, in the order they are asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub fire_in_kanto: usize,
    pub tall_water: Vec<String>,
    pub bulbasaur_chain: Vec<String>,
    pub electric_without_evolutions: Vec<String>,
    pub johto_highest_attack: Option<Ranked>,
    pub fastest_non_legendary: Option<Ranked>,
    pub grass_habitat: Mode,
    pub lightest: Option<Ranked>,
}

impl Report {
    /// Run every question against `client`, sharing its cache.
    ///
    /// Stops at the first failing question.
    pub async fn collect(client: &PokeClient) -> InsightsResult<Self> {
        let fire_in_kanto = queries::count_in_generation(client, "fire", "generation-i").await?;
        let tall_water = queries::members_at_least(client, "water", "height", 11).await?;
        let bulbasaur_chain = queries::evolution_chain(client, "bulbasaur").await?;
        let electric_without_evolutions = queries::without_evolutions(client, "electric").await?;
        let johto_highest_attack = queries::species_stat_extremum(
            client,
            &SpeciesFilter::Generation("generation-ii".to_string()),
            "attack",
            Direction::Max,
        )
        .await?;
        let fastest_non_legendary = queries::species_stat_extremum(
            client,
            &SpeciesFilter::NonLegendary,
            "speed",
            Direction::Max,
        )
        .await?;
        let grass_habitat = queries::most_common_habitat(client, "grass").await?;
        let lightest = queries::entity_attribute_extremum(client, "weight", Direction::Min).await?;

        let (pokemon, species) = client.cached_counts();
        tracing::info!("report complete: {pokemon} pokemon and {species} species cached");

        Ok(Self {
            fire_in_kanto,
            tall_water,
            bulbasaur_chain,
            electric_without_evolutions,
            johto_highest_attack,
            fastest_non_legendary,
            grass_habitat,
            lightest,
        })
    }
}

fn or_none(ranked: &Option<Ranked>) -> String {
    ranked
        .as_ref()
        .map(Ranked::to_string)
        .unwrap_or_else(|| "none".to_string())
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Fire-type species from Kanto: {}", self.fire_in_kanto)?;
        writeln!(f, "Water-type Pokémon with height >= 11: {:?}", self.tall_water)?;
        writeln!(f, "Bulbasaur evolution chain: {}", self.bulbasaur_chain.join(" -> "))?;
        writeln!(
            f,
            "Electric-type species without evolutions: {:?}",
            self.electric_without_evolutions
        )?;
        writeln!(
            f,
            "Highest base attack in Johto: {}",
            or_none(&self.johto_highest_attack)
        )?;
        writeln!(
            f,
            "Fastest non-legendary: {}",
            or_none(&self.fastest_non_legendary)
        )?;
        writeln!(
            f,
            "Most common grass-type habitat: {} ({} species)",
            self.grass_habitat.value, self.grass_habitat.count
        )?;
        match &self.lightest {
            Some(lightest) => write!(
                f,
                "Lightest Pokémon: {} ({} hg)",
                lightest.name, lightest.value
            ),
            None => write!(f, "Lightest Pokémon: none"),
        }
    }
}
