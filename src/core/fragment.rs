/// Name fragments with grammatical agreement.
///
/// A fragment carries optional gender, number and origin tags. Fragments
/// are only joined when their tags agree, and inflected fragments take the
/// form matching the tags of the rest of the combination.

use serde::{Deserialize, Serialize};

use crate::core::filter::Orthography;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Masculine,
    Feminine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Number {
    #[default]
    Singular,
    Plural,
}

/// Agreement tags. `None` agrees with anything.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Agreement {
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub number: Option<Number>,
    /// Region a term belongs to, so terms from different regions are not
    /// mixed.
    #[serde(default)]
    pub origin: Option<String>,
}

impl Agreement {
    /// The combined tags, or `None` if any tag disagrees.
    pub fn unify(&self, other: &Agreement) -> Option<Agreement> {
        Some(Agreement {
            gender: unify_tag(self.gender, other.gender)?,
            number: unify_tag(self.number, other.number)?,
            origin: unify_tag(self.origin.as_ref(), other.origin.as_ref())?.cloned(),
        })
    }
}

fn unify_tag<T: PartialEq>(a: Option<T>, b: Option<T>) -> Option<Option<T>> {
    match (a, b) {
        (Some(a), Some(b)) if a != b => None,
        (Some(a), _) => Some(Some(a)),
        (None, b) => Some(b),
    }
}

/// The text of a fragment: fixed, or one form per gender and number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Forms {
    Fixed(String),
    Inflected {
        ms: String,
        mp: String,
        fs: String,
        fp: String,
    },
}

impl Forms {
    pub fn get(&self, gender: Gender, number: Number) -> &str {
        match self {
            Forms::Fixed(text) => text,
            Forms::Inflected { ms, mp, fs, fp } => match (gender, number) {
                (Gender::Masculine, Number::Singular) => ms,
                (Gender::Masculine, Number::Plural) => mp,
                (Gender::Feminine, Number::Singular) => fs,
                (Gender::Feminine, Number::Plural) => fp,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub forms: Forms,
    pub agreement: Agreement,
}

impl Fragment {
    /// Untagged fixed text; agrees with everything.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            forms: Forms::Fixed(text.into()),
            agreement: Agreement::default(),
        }
    }

    /// Text in four forms, chosen by the rest of the combination.
    pub fn inflected(
        ms: impl Into<String>,
        mp: impl Into<String>,
        fs: impl Into<String>,
        fp: impl Into<String>,
    ) -> Self {
        Self {
            forms: Forms::Inflected {
                ms: ms.into(),
                mp: mp.into(),
                fs: fs.into(),
                fp: fp.into(),
            },
            agreement: Agreement::default(),
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.agreement.gender = Some(gender);
        self
    }

    pub fn with_number(mut self, number: Number) -> Self {
        self.agreement.number = Some(number);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.agreement.origin = Some(origin.into());
        self
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Fragment::plain(text)
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Fragment::plain(text)
    }
}

/// Every agreeing concatenation of one fragment from each list, in order,
/// passed through `filter`.
///
/// Tags are unified over the whole combination; inflected fragments then
/// take the form for the unified gender and number, masculine singular
/// where nothing decides.
pub fn combine<F: Orthography + ?Sized>(lists: &[Vec<Fragment>], filter: &F) -> Vec<String> {
    if lists.is_empty() {
        return Vec::new();
    }

    let mut partial: Vec<(Agreement, Vec<&Fragment>)> = vec![(Agreement::default(), Vec::new())];
    for list in lists {
        let mut next = Vec::with_capacity(partial.len() * list.len());
        for (agreement, picked) in &partial {
            for fragment in list {
                if let Some(unified) = agreement.unify(&fragment.agreement) {
                    let mut picked = picked.clone();
                    picked.push(fragment);
                    next.push((unified, picked));
                }
            }
        }
        partial = next;
    }

    let total = partial.len();
    let kept: Vec<String> = partial
        .iter()
        .filter_map(|(agreement, picked)| {
            let gender = agreement.gender.unwrap_or_default();
            let number = agreement.number.unwrap_or_default();
            let text: String = picked.iter().map(|f| f.forms.get(gender, number)).collect();
            filter.repair(&text)
        })
        .collect();
    if kept.len() < total {
        log::debug!("filter rejected {} of {} combinations", total - kept.len(), total);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::{AcceptAll, PatternFilter};

    #[test]
    fn articles_agree_with_nouns() {
        let articles = vec![
            Fragment::plain("un").with_gender(Gender::Masculine),
            Fragment::plain("une").with_gender(Gender::Feminine),
        ];
        let nouns = vec![
            Fragment::plain(" pastèque").with_gender(Gender::Feminine),
            Fragment::plain(" orange").with_gender(Gender::Feminine),
            Fragment::plain(" fruit").with_gender(Gender::Masculine),
        ];
        let names = combine(&[articles, nouns], &AcceptAll);
        assert_eq!(names, vec!["un fruit", "une pastèque", "une orange"]);
    }

    #[test]
    fn inflected_fragment_follows_later_tags() {
        let adjectives = vec![Fragment::inflected("Beau", "Beaux", "Belle", "Belles")];
        let nouns = vec![
            Fragment::plain("mont").with_gender(Gender::Masculine),
            Fragment::plain("fontaine").with_gender(Gender::Feminine),
            Fragment::plain("champs")
                .with_gender(Gender::Masculine)
                .with_number(Number::Plural),
            Fragment::plain("lieu"),
        ];
        let names = combine(&[adjectives, nouns], &AcceptAll);
        assert_eq!(
            names,
            vec!["Beaumont", "Bellefontaine", "Beauxchamps", "Beaulieu"]
        );
    }

    #[test]
    fn disagreement_anywhere_drops_the_combination() {
        let first = vec![Fragment::plain("La ").with_gender(Gender::Feminine)];
        let middle = vec![Fragment::plain("Roche"), Fragment::plain("Bois")];
        let last = vec![
            Fragment::plain("-mont").with_gender(Gender::Masculine),
            Fragment::plain("-aigue").with_gender(Gender::Feminine),
        ];
        let names = combine(&[first, middle, last], &AcceptAll);
        assert_eq!(names, vec!["La Roche-aigue", "La Bois-aigue"]);
    }

    #[test]
    fn origins_are_not_mixed() {
        let stems = vec![
            Fragment::plain("Ker").with_origin("breton"),
            Fragment::plain("Vil"),
        ];
        let endings = vec![
            Fragment::plain("vern").with_origin("breton"),
            Fragment::plain("heim").with_origin("alsacien"),
        ];
        let names = combine(&[stems, endings], &AcceptAll);
        assert_eq!(names, vec!["Kervern", "Vilvern", "Vilheim"]);
    }

    #[test]
    fn combined_text_is_filtered() {
        let filter = PatternFilter::new().reject("dv").unwrap();
        let lists = vec![
            vec![Fragment::from("Ad")],
            vec![Fragment::from("ve"), Fragment::from("ne")],
        ];
        assert_eq!(combine(&lists, &filter), vec!["Adne"]);
    }

    #[test]
    fn unify_tags() {
        let fem = Agreement {
            gender: Some(Gender::Feminine),
            ..Agreement::default()
        };
        let plural = Agreement {
            number: Some(Number::Plural),
            ..Agreement::default()
        };
        let both = fem.unify(&plural).unwrap();
        assert_eq!(both.gender, Some(Gender::Feminine));
        assert_eq!(both.number, Some(Number::Plural));

        let masc = Agreement {
            gender: Some(Gender::Masculine),
            ..Agreement::default()
        };
        assert!(both.unify(&masc).is_none());
    }
}
