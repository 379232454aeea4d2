use card_schema::SectionSchema;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct FieldRow<'a> {
    section: &'a str,
    field: &'a str,
    label: String,
    #[serde(rename = "type")]
    field_type: &'static str,
    required: bool,
}

/// Handle `mcard schema`.
pub fn handle(args: &SchemaArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let task = flags.task.or(ctx.config.general.default_task);
    let sections: Vec<&str> = match &args.section {
        Some(section) => {
            ctx.schema.require_section(section)?;
            vec![section.as_str()]
        }
        None => ctx.schema.section_names().collect(),
    };

    let mut rows = Vec::new();
    for section in sections {
        match ctx.schema.section(section) {
            Some(SectionSchema::Fields(_)) => {
                rows.extend(ctx.schema.applicable_fields(section, task).into_iter().map(
                    |(field, props)| FieldRow {
                        section,
                        field,
                        label: props.plain_label(field),
                        field_type: props.field_type.as_str(),
                        required: props.required_for(task),
                    },
                ));
            }
            Some(SectionSchema::Keys(keys)) => {
                rows.extend(keys.iter().map(|key| FieldRow {
                    section,
                    field: key
                        .strip_prefix(section)
                        .and_then(|rest| rest.strip_prefix('_'))
                        .unwrap_or(key),
                    label: key.clone(),
                    field_type: "text",
                    required: false,
                }));
            }
            None => {}
        }
    }
    output(&rows, flags.format)
}
