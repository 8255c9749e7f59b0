//! Analytical queries over the PokeAPI.
//!
//! Every query enumerates candidates (a type listing or a paginated global
//! listing), resolves detail documents through the client cache, and reduces
//! them to one answer. Detail fetches run through an order-preserving window
//! of `client.concurrency()` futures, so reductions always see candidates in
//! listing order. The first transport failure aborts the whole query.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::pin::pin;
use std::sync::Arc;

use futures::{stream, Stream, StreamExt, TryStreamExt};
use serde_json::Value;

use crate::chain;
use crate::client::{entry_name, PokeClient};
use crate::doc::{base_stat, default_variety, DocExt};
use crate::types::{Direction, InsightsResult, Mode, Ranked, SpeciesFilter, TransportError};

/// Paginated listing of every species.
pub const SPECIES_LISTING: &str = "pokemon-species?limit=2000";

/// Paginated listing of every Pokémon.
pub const POKEMON_LISTING: &str = "pokemon?limit=2000";

/// Count distinct species of `type_name` introduced in `generation`.
///
/// Forms of the same species are counted once.
pub async fn count_in_generation(
    client: &PokeClient,
    type_name: &str,
    generation: &str,
) -> InsightsResult<usize> {
    let members = client.category_members(type_name).await?;
    let mut groups = pin!(stream::iter(members)
        .map(|name| async move { client.species_of(&name).await })
        .buffered(client.concurrency()));

    let mut seen = HashSet::new();
    let mut count = 0;
    while let Some(species) = groups.try_next().await? {
        let Some(name) = species.str_at(&["name"]) else {
            continue;
        };
        if !seen.insert(name.to_string()) {
            continue;
        }
        if species.str_at(&["generation", "name"]) == Some(generation) {
            count += 1;
        }
    }

    tracing::info!("{type_name}: {count} species from {generation}");
    Ok(count)
}

/// Names of `type_name` Pokémon whose `attribute` is at least `threshold`,
/// sorted ascending. A missing attribute reads as 0.
pub async fn members_at_least(
    client: &PokeClient,
    type_name: &str,
    attribute: &str,
    threshold: i64,
) -> InsightsResult<Vec<String>> {
    let members = dedup(client.category_members(type_name).await?);
    let candidates = fetch_pokemon(client, members)
        .map_ok(|(name, pokemon)| {
            let value = pokemon.i64_at(&[attribute]).unwrap_or(0);
            Ranked::new(name, value)
        })
        .try_collect::<Vec<_>>()
        .await?;

    let kept = threshold_select(candidates, threshold);
    tracing::info!(
        "{type_name}: {} member(s) with {attribute} >= {threshold}",
        kept.len()
    );
    Ok(kept)
}

/// The `k` `type_name` Pokémon with the highest base `stat`.
///
/// Ordered by value descending, then name ascending. Members without the
/// stat are skipped.
pub async fn top_by_stat(
    client: &PokeClient,
    type_name: &str,
    stat: &str,
    k: usize,
) -> InsightsResult<Vec<Ranked>> {
    let members = dedup(client.category_members(type_name).await?);
    let candidates = fetch_pokemon(client, members)
        .try_filter_map(|(name, pokemon)| {
            let ranked = base_stat(&pokemon, stat).map(|value| Ranked::new(name, value));
            async move { Ok(ranked) }
        })
        .try_collect::<Vec<_>>()
        .await?;

    Ok(top_k(candidates, k))
}

/// Evolution line of a species in breadth-first order.
///
/// A species without an evolution chain yields just its own name.
pub async fn evolution_chain(client: &PokeClient, species_name: &str) -> InsightsResult<Vec<String>> {
    let species = client.species(species_name).await?;
    let line = match client.chain_of(&species).await? {
        Some(root) => chain::flatten(&root),
        None => Vec::new(),
    };

    if line.is_empty() {
        return Ok(vec![species_name.to_string()]);
    }
    Ok(line)
}

/// Species of `type_name` that neither evolve from nor into anything.
///
/// A species without an evolution chain counts as standalone. Sorted and
/// deduplicated.
pub async fn without_evolutions(client: &PokeClient, type_name: &str) -> InsightsResult<Vec<String>> {
    let members = client.category_members(type_name).await?;
    let mut verdicts = pin!(stream::iter(members)
        .map(|name| async move {
            let species = client.species_of(&name).await?;
            let root = client.chain_of(&species).await?;
            Ok::<_, TransportError>((species, root))
        })
        .buffered(client.concurrency()));

    let mut loners = BTreeSet::new();
    while let Some((species, root)) = verdicts.try_next().await? {
        let Some(name) = species.str_at(&["name"]) else {
            continue;
        };
        let is_root = species.is_null_at(&["evolves_from_species"]);
        let evolves = root
            .as_ref()
            .is_some_and(|root| chain::has_successor(root, name));
        if is_root && !evolves {
            loners.insert(name.to_string());
        }
    }

    tracing::info!("{type_name}: {} species without evolutions", loners.len());
    Ok(loners.into_iter().collect())
}

/// Best base `stat` among the default forms of species passing `filter`,
/// over the full species listing. Ties keep the first species listed.
pub async fn species_stat_extremum(
    client: &PokeClient,
    filter: &SpeciesFilter,
    stat: &str,
    direction: Direction,
) -> InsightsResult<Option<Ranked>> {
    let candidates = client
        .list_all(SPECIES_LISTING)
        .map(|entry| async move {
            let entry = entry?;
            let Some(name) = entry_name(&entry) else {
                return Ok(None);
            };
            let species = client.species(name).await?;
            if !passes(filter, &species) {
                return Ok(None);
            }
            let Some(variety) = default_variety(&species) else {
                return Ok(None);
            };
            let pokemon = client.pokemon(variety).await?;
            let ranked = base_stat(&pokemon, stat).map(|value| {
                let name = pokemon.str_at(&["name"]).unwrap_or(variety);
                Ranked::new(name, value)
            });
            Ok::<_, TransportError>(ranked)
        })
        .buffered(client.concurrency())
        .try_filter_map(|ranked| async move { Ok(ranked) });

    let best = reduce_extremum(candidates, direction).await?;
    log_extremum(stat, direction, best.as_ref());
    Ok(best)
}

/// Best top-level `attribute` (e.g. `weight`) over the full Pokémon listing.
///
/// Pokémon lacking the attribute are skipped. Ties keep the first listed.
pub async fn entity_attribute_extremum(
    client: &PokeClient,
    attribute: &str,
    direction: Direction,
) -> InsightsResult<Option<Ranked>> {
    let candidates = client
        .list_all(POKEMON_LISTING)
        .map(|entry| async move {
            let entry = entry?;
            let Some(name) = entry_name(&entry) else {
                return Ok(None);
            };
            let pokemon = client.pokemon(name).await?;
            let ranked = pokemon.i64_at(&[attribute]).map(|value| {
                Ranked::new(pokemon.str_at(&["name"]).unwrap_or(name), value)
            });
            Ok::<_, TransportError>(ranked)
        })
        .buffered(client.concurrency())
        .try_filter_map(|ranked| async move { Ok(ranked) });

    let best = reduce_extremum(candidates, direction).await?;
    log_extremum(attribute, direction, best.as_ref());
    Ok(best)
}

/// Most common habitat among the species of `type_name` members.
///
/// Every member counts, including several forms of one species. With no
/// habitat at all the answer is `("unknown", 0)`.
pub async fn most_common_habitat(client: &PokeClient, type_name: &str) -> InsightsResult<Mode> {
    let members = client.category_members(type_name).await?;
    let habitats = stream::iter(members)
        .map(|name| async move {
            let species = client.species_of(&name).await?;
            let habitat = species.str_at(&["habitat", "name"]).map(str::to_string);
            Ok::<_, TransportError>(habitat)
        })
        .buffered(client.concurrency())
        .try_filter_map(|habitat| async move { Ok(habitat) })
        .try_collect::<Vec<_>>()
        .await?;

    let mode = mode_of(habitats);
    tracing::info!("{type_name}: most common habitat {} ({})", mode.value, mode.count);
    Ok(mode)
}

// ───────────────────── reducers ─────────────────────

/// Keep candidates whose value meets `threshold`; names sorted ascending.
pub fn threshold_select(candidates: impl IntoIterator<Item = Ranked>, threshold: i64) -> Vec<String> {
    let mut names: Vec<String> = candidates
        .into_iter()
        .filter(|c| c.value >= threshold)
        .map(|c| c.name)
        .collect();
    names.sort();
    names
}

/// Running extremum with strict comparison: the first-seen candidate wins ties.
pub fn extremum(candidates: impl IntoIterator<Item = Ranked>, direction: Direction) -> Option<Ranked> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(current) if !direction.beats(candidate.value, current.value) => Some(current),
        _ => Some(candidate),
    })
}

/// Highest `k` values, ties broken by name ascending.
pub fn top_k(mut candidates: Vec<Ranked>, k: usize) -> Vec<Ranked> {
    candidates.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    candidates.truncate(k);
    candidates
}

/// Most frequent value; the value seen first wins a tie.
pub fn mode_of(values: impl IntoIterator<Item = String>) -> Mode {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for value in values {
        match index.get(&value) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(value.clone(), order.len());
                order.push((value, 1));
            }
        }
    }

    order
        .into_iter()
        .fold(None::<(String, usize)>, |best, (value, count)| match best {
            Some(current) if count <= current.1 => Some(current),
            _ => Some((value, count)),
        })
        .map(|(value, count)| Mode { value, count })
        .unwrap_or_else(Mode::unknown)
}

// ───────────────────── helpers ─────────────────────

fn passes(filter: &SpeciesFilter, species: &Value) -> bool {
    match filter {
        SpeciesFilter::Any => true,
        SpeciesFilter::Generation(generation) => {
            species.str_at(&["generation", "name"]) == Some(generation.as_str())
        }
        SpeciesFilter::NonLegendary => !species.flag(&["is_legendary"]),
    }
}

/// Drop repeated names, keeping first occurrences in order.
fn dedup(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Pokémon documents for `names`, in order, paired with their display name.
fn fetch_pokemon(
    client: &PokeClient,
    names: Vec<String>,
) -> impl Stream<Item = Result<(String, Arc<Value>), TransportError>> + '_ {
    stream::iter(names)
        .map(move |name| async move {
            let pokemon = client.pokemon(&name).await?;
            let display = pokemon.str_at(&["name"]).map(str::to_string).unwrap_or(name);
            Ok::<_, TransportError>((display, pokemon))
        })
        .buffered(client.concurrency())
}

async fn reduce_extremum<S>(candidates: S, direction: Direction) -> InsightsResult<Option<Ranked>>
where
    S: Stream<Item = Result<Ranked, TransportError>>,
{
    let best = candidates
        .try_fold(None, |best: Option<Ranked>, candidate| async move {
            Ok(extremum(best.into_iter().chain(Some(candidate)), direction))
        })
        .await?;
    Ok(best)
}

fn log_extremum(field: &str, direction: Direction, best: Option<&Ranked>) {
    match best {
        Some(best) => tracing::info!("{direction:?} {field}: {best}"),
        None => tracing::info!("{direction:?} {field}: no candidate"),
    }
}
