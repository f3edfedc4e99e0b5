mod command_parser_test;
