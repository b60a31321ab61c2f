//! Actor Compiler - NpcEntity to VTT actor document

use crate::application::dto::{
    AbilityBlock, AbilitySystem, AbilityValue, ActorDetails, ActorDocument, ActorItem,
    ActorSystem, ActorTraits, ArmorClass, HitPoints, HtmlValue, ItemSystem, MonsterAttributes,
    MonsterSystem, PrototypeToken, TokenBar, TokenSight, TokenTexture,
};
use crate::application::services::vtt::{escape_html, ShapeNormalizer, ValidationError};
use crate::domain::entities::NpcEntity;
use crate::domain::value_objects::{AbilityScores, ActorStats, FieldValue};

const DEFAULT_ABILITY_SCORE: i32 = 10;
const DEFAULT_ARMOR_CLASS: i32 = 10;
const DEFAULT_CHALLENGE_RATING: f64 = 0.0;
const HP_BAR_ATTRIBUTE: &str = "attributes.hp";

pub struct ActorCompiler;

impl ActorCompiler {
    /// Compile an NPC into the VTT's native actor document.
    ///
    /// Hit points select the monster schema; anything else compiles to the
    /// six-score ability schema.
    pub fn compile(npc: &NpcEntity) -> Result<ActorDocument, ValidationError> {
        let stats = ShapeNormalizer::normalize_actor_stats(npc.stats.as_ref())?;
        let size = stats.size();
        let details = |cr: Option<f64>| ActorDetails {
            biography: HtmlValue {
                value: biography_html(npc),
            },
            cr,
        };

        let (system, items, bar_attribute) = match &stats {
            ActorStats::Abilities(scores) => (
                ActorSystem::Abilities(AbilitySystem {
                    abilities: ability_block(scores),
                    details: details(None),
                }),
                Vec::new(),
                None,
            ),
            ActorStats::Monster(block) => (
                ActorSystem::Monster(MonsterSystem {
                    abilities: ability_block(&block.scores),
                    attributes: MonsterAttributes {
                        hp: HitPoints {
                            value: block.hit_points,
                            max: block.hit_points,
                        },
                        ac: ArmorClass {
                            flat: block.armor_class.unwrap_or(DEFAULT_ARMOR_CLASS),
                            calc: "flat".to_string(),
                        },
                    },
                    details: details(Some(
                        block.challenge_rating.unwrap_or(DEFAULT_CHALLENGE_RATING),
                    )),
                    traits: ActorTraits {
                        size: size.vtt_code().to_string(),
                    },
                }),
                block.abilities.iter().map(feat_item).collect(),
                Some(HP_BAR_ATTRIBUTE.to_string()),
            ),
        };

        let vision = npc.vision.unwrap_or_default();
        let footprint = size.footprint();

        Ok(ActorDocument {
            name: npc.name.clone(),
            actor_type: "npc".to_string(),
            img: npc.token_image.clone(),
            system,
            items,
            prototype_token: PrototypeToken {
                name: npc.name.clone(),
                actor_link: false,
                disposition: npc.disposition.unwrap_or_default().vtt_value(),
                width: footprint,
                height: footprint,
                texture: TokenTexture {
                    src: npc.token_image.clone(),
                },
                sight: TokenSight {
                    enabled: true,
                    range: vision.range,
                    angle: vision.angle,
                    vision_mode: "basic".to_string(),
                },
                bar1: TokenBar {
                    attribute: bar_attribute,
                },
            },
        })
    }
}

fn ability_block(scores: &AbilityScores) -> AbilityBlock {
    let score = |s: Option<i32>| AbilityValue {
        value: s.unwrap_or(DEFAULT_ABILITY_SCORE),
    };
    AbilityBlock {
        str: score(scores.strength),
        dex: score(scores.dexterity),
        con: score(scores.constitution),
        int: score(scores.intelligence),
        wis: score(scores.wisdom),
        cha: score(scores.charisma),
    }
}

fn feat_item(ability: &FieldValue) -> ActorItem {
    let description = match ability {
        FieldValue::Structured {
            description: Some(d),
            ..
        } => format!("<p>{}</p>", escape_html(d)),
        _ => String::new(),
    };
    ActorItem {
        name: ability.label().to_string(),
        item_type: "feat".to_string(),
        system: ItemSystem {
            description: HtmlValue { value: description },
        },
    }
}

fn biography_html(npc: &NpcEntity) -> String {
    [
        ("Role", &npc.role),
        ("Personality", &npc.personality),
        ("Motivation", &npc.motivation),
    ]
    .iter()
    .filter_map(|(label, text)| {
        let text = text.as_deref()?.trim();
        (!text.is_empty()).then(|| format!("<p><strong>{}:</strong> {}</p>", label, escape_html(text)))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{TokenDisposition, VisionConfig};
    use crate::domain::value_objects::CampaignId;
    use serde_json::json;

    #[test]
    fn test_commoner_without_stats_gets_default_scores() {
        let npc = NpcEntity::new(CampaignId::new(), "Marta").with_role("commoner");
        let actor = ActorCompiler::compile(&npc).unwrap();

        let ActorSystem::Abilities(system) = &actor.system else {
            panic!("expected the ability-score schema");
        };
        for score in [
            system.abilities.str,
            system.abilities.dex,
            system.abilities.con,
            system.abilities.int,
            system.abilities.wis,
            system.abilities.cha,
        ] {
            assert_eq!(score.value, 10);
        }
        assert_eq!(actor.actor_type, "npc");
        assert!(actor.items.is_empty());
        assert_eq!(actor.prototype_token.bar1.attribute, None);
        assert_eq!(actor.prototype_token.disposition, 0);
        assert_eq!((actor.prototype_token.width, actor.prototype_token.height), (1, 1));
        assert!(actor.prototype_token.sight.enabled);
        assert_eq!(actor.prototype_token.sight.range, 60);
        assert_eq!(actor.prototype_token.sight.angle, 360);
        assert_eq!(
            system.details.biography.value,
            "<p><strong>Role:</strong> commoner</p>"
        );

        let value = serde_json::to_value(&actor).unwrap();
        assert!(value["system"].get("attributes").is_none());
        assert!(value["system"]["details"].get("cr").is_none());
    }

    #[test]
    fn test_monster_stat_block_schema() {
        let npc = NpcEntity::new(CampaignId::new(), "Dire Wolf").with_stats(json!({
            "hitPoints": 37,
            "armorClass": 14,
            "challengeRating": "1",
            "size": "Large",
            "abilities": ["Pack Tactics", {"name": "Bite", "description": "2d6 + 3 <piercing>"}],
            "str": 17
        }));
        let actor = ActorCompiler::compile(&npc).unwrap();

        let ActorSystem::Monster(system) = &actor.system else {
            panic!("expected the monster schema");
        };
        assert_eq!(system.attributes.hp, HitPoints { value: 37, max: 37 });
        assert_eq!(system.attributes.ac.flat, 14);
        assert_eq!(system.attributes.ac.calc, "flat");
        assert_eq!(system.details.cr, Some(1.0));
        assert_eq!(system.traits.size, "lg");
        assert_eq!(system.abilities.str.value, 17);
        assert_eq!(system.abilities.dex.value, 10);

        assert_eq!(actor.items.len(), 2);
        assert_eq!(actor.items[0].item_type, "feat");
        assert_eq!(actor.items[1].system.description.value, "<p>2d6 + 3 &lt;piercing&gt;</p>");
        assert_eq!(actor.prototype_token.bar1.attribute.as_deref(), Some("attributes.hp"));
        assert_eq!((actor.prototype_token.width, actor.prototype_token.height), (2, 2));

        let value = serde_json::to_value(&actor).unwrap();
        assert_eq!(value["system"]["attributes"]["hp"]["max"], 37);
        assert_eq!(value["prototypeToken"]["actorLink"], false);
    }

    #[test]
    fn test_monster_defaults() {
        let npc = NpcEntity::new(CampaignId::new(), "Rat").with_stats(json!({"hp": "1 (1d4-1)"}));
        let actor = ActorCompiler::compile(&npc).unwrap();
        let ActorSystem::Monster(system) = &actor.system else {
            panic!("expected the monster schema");
        };
        assert_eq!(system.attributes.ac.flat, 10);
        assert_eq!(system.details.cr, Some(0.0));
        assert_eq!(system.traits.size, "med");
    }

    #[test]
    fn test_overrides_and_escaping() {
        let mut npc = NpcEntity::new(CampaignId::new(), "Vex")
            .with_personality("Sly & <cunning>")
            .with_token_image("tokens/vex.webp");
        npc.disposition = Some(TokenDisposition::Hostile);
        npc.vision = Some(VisionConfig { range: 120, angle: 90 });

        let actor = ActorCompiler::compile(&npc).unwrap();
        assert_eq!(actor.prototype_token.disposition, -1);
        assert_eq!(actor.prototype_token.sight.range, 120);
        assert_eq!(actor.prototype_token.sight.angle, 90);
        assert_eq!(actor.img.as_deref(), Some("tokens/vex.webp"));
        assert_eq!(actor.prototype_token.texture.src.as_deref(), Some("tokens/vex.webp"));

        let ActorSystem::Abilities(system) = &actor.system else {
            panic!("expected the ability-score schema");
        };
        assert_eq!(
            system.details.biography.value,
            "<p><strong>Personality:</strong> Sly &amp; &lt;cunning&gt;</p>"
        );
    }

    #[test]
    fn test_invalid_hit_points_fail_compilation() {
        let npc = NpcEntity::new(CampaignId::new(), "Ghost").with_stats(json!({"hitPoints": "many"}));
        assert!(ActorCompiler::compile(&npc).is_err());
    }
}
