use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Opaque user identifier. Ordered lexicographically, which is what the
/// canonical pair ordering of stored relationships relies on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
	/// Wraps any string-like id.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// The raw id.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for UserId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for UserId {
	fn from(id: &str) -> Self {
		Self(id.to_owned())
	}
}

/// Gender as recorded on a profile. Picks gendered kinship words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
	/// Male kinship words.
	Male,
	/// Female kinship words.
	Female,
	/// Gets the neutral form of every label.
	Other,
	/// Not recorded.
	#[default]
	Unknown,
}

impl Gender {
	/// Picks the gendered form of a word, falling back to the neutral one.
	pub fn pick<'a>(self, male: &'a str, female: &'a str, neutral: &'a str) -> &'a str {
		match self {
			Gender::Male => male,
			Gender::Female => female,
			Gender::Other | Gender::Unknown => neutral,
		}
	}
}

/// How much of a [`PartialDate`] is known.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePrecision {
	/// The full date.
	#[default]
	Day,
	/// Month and year; the day is a placeholder.
	Month,
	/// Year only.
	Year,
}

/// A date known only up to some precision ("sometime in 1950").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDate {
	/// Fields finer than `precision` are placeholders.
	pub date: NaiveDate,
	/// How much of `date` is known.
	#[serde(default)]
	pub precision: DatePrecision,
}

impl PartialDate {
	/// The year, which is always known.
	pub fn year(&self) -> i32 {
		use chrono::Datelike;
		self.date.year()
	}
}

impl fmt::Display for PartialDate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let rendered = match self.precision {
			DatePrecision::Year => self.date.format("%Y"),
			DatePrecision::Month => self.date.format("%b %Y"),
			DatePrecision::Day => self.date.format("%-d %b %Y"),
		};
		write!(f, "{rendered}")
	}
}

/// Profile data for a group member, as supplied by the persistence layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
	/// Key into the group's member list.
	pub id: UserId,
	/// Given name.
	pub first_name: String,
	/// Family name, may be empty.
	#[serde(default)]
	pub last_name: String,
	/// Picks the gendered label when this person is the target.
	#[serde(default)]
	pub gender: Gender,
	/// Birth date, if known.
	#[serde(default)]
	pub birth: Option<PartialDate>,
	/// Death date, if known.
	#[serde(default)]
	pub death: Option<PartialDate>,
	/// Free text place of birth.
	#[serde(default)]
	pub birth_place: Option<String>,
	/// Free text place of death.
	#[serde(default)]
	pub death_place: Option<String>,
	/// Public URL resolved by the photo storage service.
	#[serde(default)]
	pub photo_url: Option<String>,
}

impl Person {
	/// A person with only a name and gender on record.
	pub fn new(id: impl Into<String>, first_name: &str, last_name: &str, gender: Gender) -> Self {
		Self {
			id: UserId::new(id),
			first_name: first_name.to_owned(),
			last_name: last_name.to_owned(),
			gender,
			birth: None,
			death: None,
			birth_place: None,
			death_place: None,
			photo_url: None,
		}
	}

	/// First and last name, whichever are present, falling back to the id.
	pub fn display_name(&self) -> String {
		match (self.first_name.is_empty(), self.last_name.is_empty()) {
			(false, false) => format!("{} {}", self.first_name, self.last_name),
			(false, true) => self.first_name.clone(),
			(true, false) => self.last_name.clone(),
			(true, true) => self.id.to_string(),
		}
	}

	/// Upper-cased first letters of the names, for avatars without a photo.
	pub fn initials(&self) -> String {
		[&self.first_name, &self.last_name]
			.iter()
			.filter_map(|part| part.chars().next())
			.flat_map(char::to_uppercase)
			.collect()
	}

	/// "1921 – 1999", "b. 1950", "d. 1899" or nothing.
	pub fn lifespan(&self) -> Option<String> {
		match (&self.birth, &self.death) {
			(Some(b), Some(d)) => Some(format!("{} – {}", b.year(), d.year())),
			(Some(b), None) => Some(format!("b. {}", b.year())),
			(None, Some(d)) => Some(format!("d. {}", d.year())),
			(None, None) => None,
		}
	}
}

/// Relation stored on a canonical `(user1, user2)` pair, read as
/// "user1 is the `<relation>` of user2".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
	/// user1 is a parent of user2.
	Parent,
	/// user1 is a child of user2.
	Child,
	/// Unmarried couple.
	Partner,
	/// Married couple.
	Spouse,
	/// Siblings, full or half.
	Sibling,
	/// Family member of no particular shape.
	Relative,
}

impl Relation {
	/// The same fact read from the other side of the pair.
	pub fn inverse(self) -> Self {
		match self {
			Relation::Parent => Relation::Child,
			Relation::Child => Relation::Parent,
			other => other,
		}
	}
}

/// A stored pairwise relationship row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEdge {
	/// The smaller id of the pair.
	pub user1_id: UserId,
	/// The larger id of the pair.
	pub user2_id: UserId,
	/// What user1 is to user2.
	pub relation: Relation,
	/// Group the row belongs to.
	pub group_id: String,
}

impl RelationshipEdge {
	/// Builds a row from "`a` is the `relation` of `b`", swapping the pair into
	/// canonical order and inverting directed relations when needed.
	pub fn canonical(a: UserId, b: UserId, relation: Relation, group_id: &str) -> Self {
		let (user1_id, user2_id, relation) = if a <= b {
			(a, b, relation)
		} else {
			(b, a, relation.inverse())
		};
		Self {
			user1_id,
			user2_id,
			relation,
			group_id: group_id.to_owned(),
		}
	}

	/// Whether `id` is either endpoint.
	pub fn involves(&self, id: &UserId) -> bool {
		&self.user1_id == id || &self.user2_id == id
	}

	/// Whether both rows join the same two users, in either order.
	pub fn same_pair(&self, other: &RelationshipEdge) -> bool {
		let mine = ordered(&self.user1_id, &self.user2_id);
		mine == ordered(&other.user1_id, &other.user2_id)
	}
}

fn ordered<'a>(a: &'a UserId, b: &'a UserId) -> (&'a UserId, &'a UserId) {
	if a <= b { (a, b) } else { (b, a) }
}

/// What the related user is to the node owning the adjacency entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
	/// The related user is a parent.
	Parent,
	/// The related user is a child.
	Child,
	/// Unmarried couple.
	Partner,
	/// Married couple.
	Spouse,
	/// Full or half sibling.
	Sibling,
	/// Related in no particular shape.
	Relative,
}

impl EdgeKind {
	/// The kind seen from the other endpoint.
	pub fn inverse(self) -> Self {
		match self {
			EdgeKind::Parent => EdgeKind::Child,
			EdgeKind::Child => EdgeKind::Parent,
			other => other,
		}
	}

	/// Partner or spouse.
	pub fn is_union(self) -> bool {
		matches!(self, EdgeKind::Partner | EdgeKind::Spouse)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn date(y: i32, m: u32, d: u32, precision: DatePrecision) -> PartialDate {
		PartialDate {
			date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
			precision,
		}
	}

	#[test]
	fn partial_dates_render_at_their_precision() {
		assert_eq!(date(1950, 3, 12, DatePrecision::Year).to_string(), "1950");
		assert_eq!(date(1950, 3, 12, DatePrecision::Month).to_string(), "Mar 1950");
		assert_eq!(date(1950, 3, 2, DatePrecision::Day).to_string(), "2 Mar 1950");
	}

	#[test]
	fn canonical_rows_swap_and_invert() {
		let row = RelationshipEdge::canonical("zoe".into(), "adam".into(), Relation::Parent, "g");
		assert_eq!(row.user1_id, UserId::from("adam"));
		assert_eq!(row.user2_id, UserId::from("zoe"));
		assert_eq!(row.relation, Relation::Child);

		let row = RelationshipEdge::canonical("zoe".into(), "adam".into(), Relation::Spouse, "g");
		assert_eq!(row.relation, Relation::Spouse);
	}

	#[test]
	fn person_names_and_lifespan() {
		let mut p = Person::new("u1", "ada", "lovelace", Gender::Female);
		assert_eq!(p.display_name(), "ada lovelace");
		assert_eq!(p.initials(), "AL");
		assert_eq!(p.lifespan(), None);
		p.birth = Some(date(1815, 12, 10, DatePrecision::Day));
		assert_eq!(p.lifespan().as_deref(), Some("b. 1815"));
		p.death = Some(date(1852, 11, 27, DatePrecision::Year));
		assert_eq!(p.lifespan().as_deref(), Some("1815 – 1852"));
	}
}
