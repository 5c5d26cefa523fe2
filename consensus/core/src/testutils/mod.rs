pub mod op_true_script;
