use crate::types::{ExtendParams, GenerateParams, TransformParams, UndoParams};
use serde_json::{json, Value};

/// Model names resolvable by `GenerateParams::model_index`. Out-of-range
/// indices are clamped to the last entry, never rejected.
pub const MODEL_NAMES: &[&str] = &[
    "musicgen-stereo-small",
    "musicgen-stereo-medium",
    "musicgen-stereo-large",
    "musicgen-stereo-melody-large",
];

/// Named transform variations, resolvable by `TransformParams::variation_index`.
pub const VARIATIONS: &[&str] = &[
    "accordion_folk",
    "banjo_bluegrass",
    "piano_classical",
    "piano_jazz",
    "guitar_acoustic",
    "guitar_flamenco",
    "guitar_metal",
    "guitar_blues",
    "violin_classical",
    "strings_cinematic",
    "synth_analog",
    "synth_retrowave",
    "synth_ambient",
    "organ_church",
    "organ_funk",
    "rhodes_soul",
    "harp_ethereal",
    "marimba_tropical",
    "kalimba_lofi",
    "sitar_psychedelic",
    "brass_funk",
    "sax_smooth",
    "trumpet_jazz",
    "flute_folk",
    "choir_epic",
    "vocal_ethereal",
    "drums_breakbeat",
    "drums_techno",
    "bass_dub",
    "orchestra_epic",
    "lofi_chill",
    "ambient_drone",
];

// Fixed MusicGen sampling hyperparameters for generate/continue submissions.
const TOP_K: u32 = 250;
const TEMPERATURE: f64 = 1.0;
const CFG_COEF: f64 = 3.0;

pub const GENERATE_PATH: &str = "/api/juce/process_audio";
pub const CONTINUE_PATH: &str = "/api/juce/continue_music";
pub const EXTEND_PATH: &str = "/audio/generate";
pub const EXTEND_LOOP_PATH: &str = "/audio/generate/loop";
pub const TRANSFORM_PATH: &str = "/api/juce/transform_audio";
pub const UNDO_PATH: &str = "/api/juce/undo_transform";

#[derive(Debug, Clone)]
pub struct EncodedRequest {
    pub path: &'static str,
    pub body: Value,
}

/// Generate and Continue share a body; `continuation` only selects the path.
pub fn encode_generate(params: &GenerateParams, continuation: bool) -> EncodedRequest {
    let model_index = params.model_index.min(MODEL_NAMES.len() - 1);
    let body = json!({
        "model_name": MODEL_NAMES[model_index],
        "prompt_duration": params.prompt_duration_seconds.clamp(1, 15),
        "audio_data": params.audio_base64,
        "top_k": TOP_K,
        "temperature": TEMPERATURE,
        "cfg_coef": CFG_COEF,
        "description": params.description,
    });
    EncodedRequest { path: if continuation { CONTINUE_PATH } else { GENERATE_PATH }, body }
}

pub fn encode_extend(params: &ExtendParams) -> EncodedRequest {
    let mut body = json!({
        "prompt": params.prompt,
        "steps": params.steps.clamp(4, 50),
        "cfg_scale": params.cfg_scale,
        "return_format": "base64",
        "seed": -1,
    });
    if params.generate_as_loop {
        body["loop_type"] = json!(params.loop_type.as_str());
    }
    EncodedRequest { path: if params.generate_as_loop { EXTEND_LOOP_PATH } else { EXTEND_PATH }, body }
}

/// Exactly one of `variation` / `custom_prompt` goes on the wire; a
/// non-negative variation index wins over a custom prompt.
pub fn encode_transform(params: &TransformParams) -> EncodedRequest {
    let mut body = json!({
        "audio_data": params.audio_base64,
        "flowstep": params.flowstep.clamp(0.05, 0.15),
        "solver": if params.use_midpoint_solver { "midpoint" } else { "euler" },
    });
    if params.variation_index >= 0 {
        let index = (params.variation_index as usize).min(VARIATIONS.len() - 1);
        body["variation"] = json!(VARIATIONS[index]);
    } else {
        body["custom_prompt"] = json!(params.custom_prompt);
    }
    EncodedRequest { path: TRANSFORM_PATH, body }
}

pub fn encode_undo(params: &UndoParams) -> EncodedRequest {
    EncodedRequest { path: UNDO_PATH, body: json!({ "session_id": params.session_id }) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LoopType;

    fn generate_params() -> GenerateParams {
        GenerateParams {
            audio_base64: "AAAA".into(),
            prompt_duration_seconds: 6,
            model_index: 1,
            description: "dreamy pianos".into(),
        }
    }

    #[test]
    fn generate_body_carries_fixed_sampling_params() {
        let encoded = encode_generate(&generate_params(), false);
        assert_eq!(encoded.path, "/api/juce/process_audio");
        assert_eq!(encoded.body["model_name"], "musicgen-stereo-medium");
        assert_eq!(encoded.body["prompt_duration"], 6);
        assert_eq!(encoded.body["top_k"], 250);
        assert_eq!(encoded.body["temperature"], 1.0);
        assert_eq!(encoded.body["cfg_coef"], 3.0);
        assert_eq!(encoded.body["description"], "dreamy pianos");
    }

    #[test]
    fn continuation_switches_path_only() {
        let direct = encode_generate(&generate_params(), false);
        let continued = encode_generate(&generate_params(), true);
        assert_eq!(continued.path, "/api/juce/continue_music");
        assert_eq!(direct.body, continued.body);
    }

    #[test]
    fn out_of_range_model_index_is_clamped() {
        let mut params = generate_params();
        params.model_index = 99;
        let encoded = encode_generate(&params, false);
        assert_eq!(encoded.body["model_name"], *MODEL_NAMES.last().unwrap());
    }

    #[test]
    fn prompt_duration_is_clamped_into_range() {
        let mut params = generate_params();
        params.prompt_duration_seconds = 200;
        assert_eq!(encode_generate(&params, false).body["prompt_duration"], 15);
        params.prompt_duration_seconds = 0;
        assert_eq!(encode_generate(&params, false).body["prompt_duration"], 1);
    }

    #[test]
    fn extend_always_requests_base64_with_random_seed() {
        let params = ExtendParams {
            prompt: "four on the floor".into(),
            steps: 8,
            cfg_scale: 1.2,
            generate_as_loop: false,
            loop_type: LoopType::Auto,
        };
        let encoded = encode_extend(&params);
        assert_eq!(encoded.path, "/audio/generate");
        assert_eq!(encoded.body["return_format"], "base64");
        assert_eq!(encoded.body["seed"], -1);
        assert!(encoded.body.get("loop_type").is_none());
    }

    #[test]
    fn extend_loop_selects_loop_path_and_loop_type() {
        let params = ExtendParams {
            prompt: "break".into(),
            steps: 60,
            cfg_scale: 1.0,
            generate_as_loop: true,
            loop_type: LoopType::Drums,
        };
        let encoded = encode_extend(&params);
        assert_eq!(encoded.path, "/audio/generate/loop");
        assert_eq!(encoded.body["loop_type"], "drums");
        assert_eq!(encoded.body["steps"], 50);
    }

    #[test]
    fn transform_variation_index_resolves_named_variation() {
        let params = TransformParams {
            audio_base64: "AAAA".into(),
            flowstep: 0.1,
            use_midpoint_solver: true,
            variation_index: 2,
            custom_prompt: String::new(),
        };
        let encoded = encode_transform(&params);
        assert_eq!(encoded.path, "/api/juce/transform_audio");
        assert_eq!(encoded.body["variation"], "piano_classical");
        assert_eq!(encoded.body["solver"], "midpoint");
        assert!(encoded.body.get("custom_prompt").is_none());
    }

    #[test]
    fn transform_variation_wins_over_custom_prompt() {
        let params = TransformParams {
            audio_base64: "AAAA".into(),
            flowstep: 0.1,
            use_midpoint_solver: false,
            variation_index: 0,
            custom_prompt: "underwater cathedral".into(),
        };
        let encoded = encode_transform(&params);
        assert_eq!(encoded.body["variation"], "accordion_folk");
        assert!(encoded.body.get("custom_prompt").is_none());
    }

    #[test]
    fn transform_negative_index_sends_custom_prompt() {
        let params = TransformParams {
            audio_base64: "AAAA".into(),
            flowstep: 0.5,
            use_midpoint_solver: false,
            variation_index: -1,
            custom_prompt: "underwater cathedral".into(),
        };
        let encoded = encode_transform(&params);
        assert_eq!(encoded.body["custom_prompt"], "underwater cathedral");
        assert!(encoded.body.get("variation").is_none());
        assert_eq!(encoded.body["solver"], "euler");
        assert_eq!(encoded.body["flowstep"], 0.15);
    }

    #[test]
    fn undo_body_is_just_the_session_id() {
        let encoded = encode_undo(&UndoParams { session_id: "abc".into() });
        assert_eq!(encoded.path, "/api/juce/undo_transform");
        assert_eq!(encoded.body, serde_json::json!({ "session_id": "abc" }));
    }

    #[test]
    fn variation_table_has_stable_shape() {
        assert_eq!(VARIATIONS.len(), 32);
        assert_eq!(VARIATIONS[2], "piano_classical");
    }
}
