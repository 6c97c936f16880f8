//! Random family universe generation.
//!
//! People are created bracket by bracket, oldest first. Within a bracket,
//! singles are paired into couples and every couple becomes the source of the
//! next bracket's children. Every fact is checked against the store's
//! invariants before it is asserted; a rejected edge is logged and skipped, so
//! the resulting universe is consistent by construction.

mod attributes;
mod names;

use std::collections::HashSet;

use chrono::NaiveDate;
use rand::prelude::*;
use rand_xorshift::XorShiftRng;
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::datalog::{Constant, Literal, Term};
use crate::engine::invariants::{FEMALE, MALE, MARRIED, PARENT};
use crate::engine::{Database, GroundAtom};
use crate::error::{Error, Result};
use crate::rules::family_database;

pub use attributes::{HOBBIES, JOBS};
use attributes::{BIRTH_YEAR_SPREAD, FOUNDER_BIRTH_YEAR, GENERATION_SPAN};
use names::{FEMALE_FIRST_NAMES, MALE_FIRST_NAMES, SURNAMES};

/// Random first names tried before falling back to a numeric suffix.
const NAME_ATTEMPTS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn predicate(self) -> &'static str {
        match self {
            Gender::Male => MALE,
            Gender::Female => FEMALE,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }

    fn first_names(self) -> &'static [&'static str] {
        match self {
            Gender::Male => MALE_FIRST_NAMES,
            Gender::Female => FEMALE_FIRST_NAMES,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Person {
    pub name: String,
    pub gender: Gender,
    /// Bracket index, 0 for founders.
    pub generation: usize,
    pub spouse: Option<String>,
    pub job: String,
    pub hobby: String,
    pub dob: NaiveDate,
}

/// A generated store together with the people it describes, in creation order.
#[derive(Clone, Debug)]
pub struct Universe {
    pub store: Database,
    pub people: Vec<Person>,
}

impl Universe {
    pub fn person(&self, name: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.name == name)
    }

    pub fn generations(&self) -> usize {
        self.people
            .iter()
            .map(|p| p.generation + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Generate a family universe. The store has the family rules loaded with the
/// given depth bound.
pub fn generate(config: &GeneratorConfig, max_depth: usize) -> Result<Universe> {
    config.validate()?;
    let mut builder = Builder::new(config, max_depth)?;

    builder.add_founders()?;
    for generation in 0..=config.max_generations {
        let couples = builder.pair_bracket(generation)?;
        debug!(generation, couples = couples.len(), "paired bracket");
        if generation == config.max_generations {
            break;
        }
        for (husband, wife) in couples {
            builder.add_children(husband, wife, generation + 1)?;
        }
    }

    let people = builder.assign_attributes()?;
    let universe = Universe {
        store: builder.store,
        people,
    };
    info!(
        people = universe.people.len(),
        generations = universe.generations(),
        facts = universe.store.fact_count(),
        seed = config.seed,
        "generated family universe"
    );
    Ok(universe)
}

struct Member {
    name: String,
    surname: String,
    gender: Gender,
    generation: usize,
    spouse: Option<usize>,
}

struct Builder<'a> {
    config: &'a GeneratorConfig,
    rng: XorShiftRng,
    store: Database,
    members: Vec<Member>,
    taken: HashSet<String>,
}

fn pick(rng: &mut XorShiftRng, pool: &[&'static str]) -> &'static str {
    pool[rng.gen_range(0..pool.len())]
}

fn atom(predicate: &str, args: &[&str]) -> GroundAtom {
    GroundAtom::new(predicate, args.iter().map(|a| Constant::from(*a)).collect())
}

impl<'a> Builder<'a> {
    fn new(config: &'a GeneratorConfig, max_depth: usize) -> Result<Self> {
        Ok(Builder {
            config,
            rng: XorShiftRng::seed_from_u64(config.seed),
            store: family_database(max_depth)?,
            members: Vec::with_capacity(config.population),
            taken: HashSet::new(),
        })
    }

    fn budget(&self) -> usize {
        self.config.population.saturating_sub(self.members.len())
    }

    fn fresh_name(&mut self, gender: Gender, surname: &str) -> String {
        for _ in 0..NAME_ATTEMPTS {
            let name = format!("{} {surname}", pick(&mut self.rng, gender.first_names()));
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
        let base = format!("{} {surname}", pick(&mut self.rng, gender.first_names()));
        let mut suffix = 2;
        loop {
            let name = format!("{base} {suffix}");
            if self.taken.insert(name.clone()) {
                return name;
            }
            suffix += 1;
        }
    }

    /// Create a person with their gender and, for children, both parent edges.
    /// Returns `None` when an edge is rejected; nothing is asserted then.
    fn add_person(
        &mut self,
        generation: usize,
        gender: Gender,
        surname: Option<String>,
        parents: Option<(usize, usize)>,
    ) -> Result<Option<usize>> {
        let surname = surname.unwrap_or_else(|| pick(&mut self.rng, SURNAMES).to_string());
        let name = self.fresh_name(gender, &surname);

        let mut facts = vec![atom(gender.predicate(), &[name.as_str()])];
        if let Some((father, mother)) = parents {
            facts.push(atom(PARENT, &[name.as_str(), self.members[father].name.as_str()]));
            facts.push(atom(PARENT, &[name.as_str(), self.members[mother].name.as_str()]));
        }
        if let Some(err) = facts.iter().find_map(|f| self.store.check(f).err()) {
            warn!(person = %name, error = %err, "rejected person");
            self.taken.remove(&name);
            return Ok(None);
        }
        for fact in facts {
            self.store.assert_atom(fact)?;
        }

        self.members.push(Member {
            name,
            surname,
            gender,
            generation,
            spouse: None,
        });
        Ok(Some(self.members.len() - 1))
    }

    fn add_founders(&mut self) -> Result<()> {
        let count = self.config.founder_count().min(self.config.population);
        let mut genders: Vec<Gender> = (0..count)
            .map(|i| if i % 2 == 0 { Gender::Male } else { Gender::Female })
            .collect();
        genders.shuffle(&mut self.rng);
        for gender in genders {
            self.add_person(0, gender, None, None)?;
        }
        debug!(founders = self.members.len(), "added founders");
        Ok(())
    }

    /// Parents and grandparents of a member.
    fn close_kin(&self, member: usize) -> HashSet<Constant> {
        let mut kin = HashSet::new();
        let me = Constant::from(self.members[member].name.as_str());
        for fact in self.store.lookup(PARENT, 0, &me) {
            let parent = &fact.terms[1];
            kin.insert(parent.clone());
            for up in self.store.lookup(PARENT, 0, parent) {
                kin.insert(up.terms[1].clone());
            }
        }
        kin
    }

    fn related(&self, a: usize, b: usize) -> bool {
        !self.close_kin(a).is_disjoint(&self.close_kin(b))
    }

    fn marriage_facts(&self, husband: usize, wife: usize) -> [GroundAtom; 2] {
        let (h, w) = (self.members[husband].name.as_str(), self.members[wife].name.as_str());
        [atom(MARRIED, &[h, w]), atom(MARRIED, &[w, h])]
    }

    fn marry(&mut self, husband: usize, wife: usize) -> Result<bool> {
        let facts = self.marriage_facts(husband, wife);
        if let Some(err) = facts.iter().find_map(|f| self.store.check(f).err()) {
            warn!(error = %err, "rejected marriage");
            return Ok(false);
        }
        for fact in facts {
            self.store.assert_atom(fact)?;
        }
        self.members[husband].spouse = Some(wife);
        self.members[wife].spouse = Some(husband);
        Ok(true)
    }

    fn divorce(&mut self, husband: usize, wife: usize) -> Result<()> {
        for fact in self.marriage_facts(husband, wife) {
            self.store.retract(&fact.to_literal())?;
        }
        self.members[husband].spouse = None;
        self.members[wife].spouse = None;
        Ok(())
    }

    /// Pair the singles of a bracket. Returns (husband, wife) couples.
    fn pair_bracket(&mut self, generation: usize) -> Result<Vec<(usize, usize)>> {
        let mut singles: Vec<usize> = (0..self.members.len())
            .filter(|&i| self.members[i].generation == generation && self.members[i].spouse.is_none())
            .collect();
        singles.shuffle(&mut self.rng);

        let mut couples = Vec::new();
        let males: Vec<usize> = singles
            .iter()
            .copied()
            .filter(|&i| self.members[i].gender == Gender::Male)
            .collect();
        for husband in males {
            let partner = singles.iter().copied().find(|&wife| {
                self.members[wife].gender == Gender::Female
                    && self.members[wife].spouse.is_none()
                    && !self.related(husband, wife)
            });
            match partner {
                Some(wife) => {
                    if self.marry(husband, wife)? {
                        couples.push((husband, wife));
                    }
                }
                None => {
                    if let Some(couple) = self.repair(husband, &singles, &mut couples)? {
                        couples.push(couple);
                    }
                }
            }
        }

        for single in singles {
            if self.members[single].spouse.is_some() {
                continue;
            }
            if self.budget() == 0 || !self.rng.gen_bool(self.config.outside_spouse_probability) {
                continue;
            }
            let gender = self.members[single].gender.opposite();
            let Some(spouse) = self.add_person(generation, gender, None, None)? else {
                continue;
            };
            let couple = match gender {
                Gender::Female => (single, spouse),
                Gender::Male => (spouse, single),
            };
            if self.marry(couple.0, couple.1)? {
                debug!(person = %self.members[single].name, "married in from outside");
                couples.push(couple);
            }
        }
        Ok(couples)
    }

    /// A male left without an unrelated partner takes the wife of an earlier
    /// couple whose husband can be re-paired with a remaining single female.
    fn repair(
        &mut self,
        husband: usize,
        singles: &[usize],
        couples: &mut [(usize, usize)],
    ) -> Result<Option<(usize, usize)>> {
        for slot in 0..couples.len() {
            let (other, wife) = couples[slot];
            if self.related(husband, wife) {
                continue;
            }
            let replacement = singles.iter().copied().find(|&f| {
                self.members[f].gender == Gender::Female
                    && self.members[f].spouse.is_none()
                    && !self.related(other, f)
            });
            let Some(replacement) = replacement else {
                continue;
            };
            self.divorce(other, wife)?;
            if self.marry(other, replacement)? && self.marry(husband, wife)? {
                debug!(
                    husband = %self.members[husband].name,
                    wife = %self.members[wife].name,
                    "re-paired couple"
                );
                couples[slot] = (other, replacement);
                return Ok(Some((husband, wife)));
            }
            return Err(Error::contradiction(
                format!("married({}, {})", self.members[other].name, self.members[replacement].name),
                "re-pairing failed after the partners were checked",
            ));
        }
        Ok(None)
    }

    fn add_children(&mut self, father: usize, mother: usize, generation: usize) -> Result<()> {
        let wanted = self.rng.gen_range(0..=self.config.max_children);
        let count = wanted.min(self.budget());
        if count < wanted {
            debug!(wanted, count, "lowered batch to the remaining population budget");
        }
        for _ in 0..count {
            let gender = if self.rng.gen_bool(0.5) {
                Gender::Male
            } else {
                Gender::Female
            };
            let surname = self.members[father].surname.clone();
            self.add_person(generation, gender, Some(surname), Some((father, mother)))?;
        }
        Ok(())
    }

    fn assign_attributes(&mut self) -> Result<Vec<Person>> {
        let mut people = Vec::with_capacity(self.members.len());
        for i in 0..self.members.len() {
            let job = pick(&mut self.rng, JOBS).to_string();
            let hobby = pick(&mut self.rng, HOBBIES).to_string();
            let dob = self.birth_date(self.members[i].generation)?;

            let name = self.members[i].name.clone();
            let date = dob.format("%Y-%m-%d").to_string();
            for (attribute, value) in [("job", &job), ("hobby", &hobby), ("dob", &date)] {
                self.store.assert(&Literal::new(
                    attribute,
                    vec![Term::atom(name.as_str()), Term::atom(value.as_str())],
                ))?;
            }

            let member = &self.members[i];
            people.push(Person {
                name,
                gender: member.gender,
                generation: member.generation,
                spouse: member.spouse.map(|s| self.members[s].name.clone()),
                job,
                hobby,
                dob,
            });
        }
        Ok(people)
    }

    fn birth_date(&mut self, generation: usize) -> Result<NaiveDate> {
        let generation = i32::try_from(generation)
            .map_err(|_| Error::Config(format!("generation {generation} out of range")))?;
        let year = FOUNDER_BIRTH_YEAR
            + generation * GENERATION_SPAN
            + self.rng.gen_range(0..BIRTH_YEAR_SPREAD);
        let month = self.rng.gen_range(1..=12);
        let day = self.rng.gen_range(1..=28);
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| Error::Config(format!("no date {year}-{month:02}-{day:02}")))
    }
}
